// Licensed under the Apache-2.0 license

/// States of the boot dispatcher. The numeric values are reported as
/// checkpoints and must stay stable.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootState {
    CheckOverride = 1,
    CheckNewImage = 2,
    VerifyAndInstall = 3,
    UpdateFlagPage = 4,
    BootExisting = 5,
    WaitForHost = 6,
}

impl BootState {
    pub const fn name(self) -> &'static str {
        match self {
            BootState::CheckOverride => "check override",
            BootState::CheckNewImage => "check new image",
            BootState::VerifyAndInstall => "verify and install",
            BootState::UpdateFlagPage => "update flag page",
            BootState::BootExisting => "boot existing",
            BootState::WaitForHost => "wait for host",
        }
    }
}

impl From<BootState> for u16 {
    fn from(state: BootState) -> u16 {
        state as u16
    }
}
