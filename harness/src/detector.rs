use crate::zone::Zone;
use core::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Ok,
    Warning,
    Danger,
    Corrupted,
    Error,
}

impl Status {
    /// Whether the driver stops issuing operations after a step with this
    /// status. `Warning` is informational only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Danger | Self::Corrupted | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
            Self::Corrupted => "CORRUPTED",
            Self::Error => "ERROR",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides the status of one step from the decryption outcome.
///
/// In the report-only flavor (the default) the zone never influences the
/// status. With `halt_on_danger_zone` set, a matching value in the danger
/// zone is an attack success and a matching value in the warning zone is
/// echoed as [`Status::Warning`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Detector {
    halt_on_danger_zone: bool,
}

impl Detector {
    pub fn new(halt_on_danger_zone: bool) -> Self {
        Self { halt_on_danger_zone }
    }

    pub fn halt_on_danger_zone(&self) -> bool {
        self.halt_on_danger_zone
    }

    /// Returns the status and the corruption flag to carry into the next step.
    pub fn detect<E>(
        &self,
        decrypted: &Result<u64, E>,
        expected: u64,
        zone: Zone,
        corrupted: bool,
    ) -> (Status, bool) {
        let value = match decrypted {
            Err(_) => return (Status::Error, true),
            Ok(_) if corrupted => return (Status::Corrupted, true),
            Ok(value) => *value,
        };
        if value != expected {
            return (Status::Corrupted, true);
        }
        match (self.halt_on_danger_zone, zone) {
            (true, Zone::Danger) => (Status::Danger, true),
            (true, Zone::Warning) => (Status::Warning, false),
            _ => (Status::Ok, false),
        }
    }
}
