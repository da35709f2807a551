//! Named projector functions on top of the register accessors.
//!
//! Every helper here is a thin mapping onto [`Session::write`],
//! [`Session::write_key`] or one of the reads; none of them touch the wire
//! directly.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::Serialize;
use vsctl_session::{Session, SessionError};

/// Register addresses used by [`Projector`].
pub mod register {
    pub const POWER_ON: u16 = 0x1100;
    pub const POWER_OFF: u16 = 0x1101;
    pub const POWER_STATE: u16 = 0x1100;
    pub const LIGHT_SOURCE_MODE: u16 = 0x1110;
    pub const PROJECTOR_STATUS: u16 = 0x1126;
    pub const CONTRAST: u16 = 0x1202;
    pub const VOLUME_SET: u16 = 0x132A;
    pub const MUTE: u16 = 0x1400;
    pub const VOLUME_UP: u16 = 0x1401;
    pub const VOLUME_DOWN: u16 = 0x1402;
    pub const VOLUME: u16 = 0x1403;
    pub const LIGHT_SOURCE_USAGE: u16 = 0x1501;
    pub const TEMPERATURE: u16 = 0x1503;
    pub const ERROR_STATUS: u16 = 0x0D0D;
    pub const REMOTE_KEY: u16 = 0x0204;
}

/// Bytes preceding the data in a read response (sub-address + one zero byte).
const READ_PREFIX_LEN: usize = 2;

/// Errors from device helpers.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A multi-byte register answered with fewer data bytes than its record needs.
    #[error("register {register:#06X} returned {received} data bytes, need {expected}")]
    ShortRecord {
        register: u16,
        expected: usize,
        received: usize,
    },
}

impl DeviceError {
    pub fn is_disabled(&self) -> bool {
        matches!(self, DeviceError::Session(SessionError::FunctionDisabled))
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerState {
    Off,
    On,
}

impl PowerState {
    pub fn from_code(code: u8) -> Self {
        if code == 0x01 {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerState::Off => "off",
            PowerState::On => "on",
        })
    }
}

/// Lamp/laser lifecycle as reported by register 0x1126.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectorStatus {
    PowerOff,
    WarmUp,
    PowerOn,
    CoolDown,
    Other(u8),
}

impl ProjectorStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => ProjectorStatus::PowerOff,
            0x01 => ProjectorStatus::WarmUp,
            0x02 => ProjectorStatus::PowerOn,
            0x03 => ProjectorStatus::CoolDown,
            other => ProjectorStatus::Other(other),
        }
    }
}

impl fmt::Display for ProjectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectorStatus::PowerOff => f.write_str("power-off"),
            ProjectorStatus::WarmUp => f.write_str("warm-up"),
            ProjectorStatus::PowerOn => f.write_str("power-on"),
            ProjectorStatus::CoolDown => f.write_str("cool-down"),
            ProjectorStatus::Other(code) => write!(f, "unknown (0x{code:02X})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightSourceMode {
    Normal,
    Eco,
    DynamicEco,
    SuperEco,
    Other(u8),
}

impl LightSourceMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => LightSourceMode::Normal,
            0x01 => LightSourceMode::Eco,
            0x02 => LightSourceMode::DynamicEco,
            0x03 => LightSourceMode::SuperEco,
            other => LightSourceMode::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            LightSourceMode::Normal => 0x00,
            LightSourceMode::Eco => 0x01,
            LightSourceMode::DynamicEco => 0x02,
            LightSourceMode::SuperEco => 0x03,
            LightSourceMode::Other(code) => code,
        }
    }
}

impl fmt::Display for LightSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightSourceMode::Normal => f.write_str("normal"),
            LightSourceMode::Eco => f.write_str("eco"),
            LightSourceMode::DynamicEco => f.write_str("dynamic-eco"),
            LightSourceMode::SuperEco => f.write_str("super-eco"),
            LightSourceMode::Other(code) => write!(f, "unknown (0x{code:02X})"),
        }
    }
}

/// Remote-control buttons accepted by the key register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    Menu,
    Exit,
    Top,
    Bottom,
    Left,
    Right,
    Source,
    Enter,
    Auto,
    MyButton,
}

impl RemoteKey {
    pub const ALL: [RemoteKey; 10] = [
        RemoteKey::Menu,
        RemoteKey::Exit,
        RemoteKey::Top,
        RemoteKey::Bottom,
        RemoteKey::Left,
        RemoteKey::Right,
        RemoteKey::Source,
        RemoteKey::Enter,
        RemoteKey::Auto,
        RemoteKey::MyButton,
    ];

    pub fn code(self) -> u8 {
        match self {
            RemoteKey::Menu => 0x0F,
            RemoteKey::Exit => 0x13,
            RemoteKey::Top => 0x0B,
            RemoteKey::Bottom => 0x0C,
            RemoteKey::Left => 0x0D,
            RemoteKey::Right => 0x0E,
            RemoteKey::Source => 0x04,
            RemoteKey::Enter => 0x15,
            RemoteKey::Auto => 0x08,
            RemoteKey::MyButton => 0x11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RemoteKey::Menu => "menu",
            RemoteKey::Exit => "exit",
            RemoteKey::Top => "top",
            RemoteKey::Bottom => "bottom",
            RemoteKey::Left => "left",
            RemoteKey::Right => "right",
            RemoteKey::Source => "source",
            RemoteKey::Enter => "enter",
            RemoteKey::Auto => "auto",
            RemoteKey::MyButton => "my-button",
        }
    }
}

impl FromStr for RemoteKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        RemoteKey::ALL
            .into_iter()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| format!("unknown remote key: {s}"))
    }
}

/// Snapshot of the values `vsctl status` shows.
///
/// Fields the device greys out in its current state (most of them while in
/// standby) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub address: String,
    pub power: PowerState,
    pub status: ProjectorStatus,
    pub mute: Option<bool>,
    pub volume: Option<u8>,
    pub light_source_mode: Option<LightSourceMode>,
    pub light_source_hours: Option<u32>,
    pub temperature_c: Option<f32>,
}

/// A projector reached through a [`Session`].
#[derive(Debug)]
pub struct Projector {
    session: Session,
}

impl Projector {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn close(&self) {
        self.session.close().await;
    }

    pub async fn set_power(&self, on: bool) -> Result<()> {
        let register = if on {
            register::POWER_ON
        } else {
            register::POWER_OFF
        };
        Ok(self.session.write(register, 0x00).await?)
    }

    pub async fn power(&self) -> Result<PowerState> {
        let code = self.session.read(register::POWER_STATE).await?;
        Ok(PowerState::from_code(code))
    }

    pub async fn status(&self) -> Result<ProjectorStatus> {
        let code = self.session.read(register::PROJECTOR_STATUS).await?;
        Ok(ProjectorStatus::from_code(code))
    }

    pub async fn set_mute(&self, mute: bool) -> Result<()> {
        Ok(self.session.write(register::MUTE, u8::from(mute)).await?)
    }

    pub async fn mute(&self) -> Result<bool> {
        Ok(self.session.read(register::MUTE).await? == 0x01)
    }

    pub async fn volume(&self) -> Result<u8> {
        Ok(self.session.read(register::VOLUME).await?)
    }

    pub async fn set_volume(&self, level: u8) -> Result<()> {
        Ok(self.session.write(register::VOLUME_SET, level).await?)
    }

    pub async fn volume_up(&self) -> Result<()> {
        Ok(self.session.write(register::VOLUME_UP, 0x00).await?)
    }

    pub async fn volume_down(&self) -> Result<()> {
        Ok(self.session.write(register::VOLUME_DOWN, 0x00).await?)
    }

    pub async fn light_source_mode(&self) -> Result<LightSourceMode> {
        let code = self.session.read(register::LIGHT_SOURCE_MODE).await?;
        Ok(LightSourceMode::from_code(code))
    }

    pub async fn set_light_source_mode(&self, mode: LightSourceMode) -> Result<()> {
        Ok(self
            .session
            .write(register::LIGHT_SOURCE_MODE, mode.code())
            .await?)
    }

    /// Hours the lamp or laser has been lit.
    pub async fn light_source_hours(&self) -> Result<u32> {
        let payload = self.session.read_n_bytes(register::LIGHT_SOURCE_USAGE).await?;
        le_u32(register::LIGHT_SOURCE_USAGE, &payload)
    }

    /// Operating temperature in degrees Celsius.
    pub async fn temperature(&self) -> Result<f32> {
        let payload = self.session.read_n_bytes(register::TEMPERATURE).await?;
        Ok(le_u32(register::TEMPERATURE, &payload)? as f32 / 10.0)
    }

    /// Raw error-status record, undecoded.
    pub async fn error_status(&self) -> Result<Bytes> {
        Ok(self.session.read_n_bytes(register::ERROR_STATUS).await?)
    }

    pub async fn contrast(&self) -> Result<i16> {
        Ok(self.session.read_2_bytes(register::CONTRAST).await?)
    }

    pub async fn send_remote_key(&self, key: RemoteKey) -> Result<()> {
        Ok(self
            .session
            .write_key(register::REMOTE_KEY, key.code())
            .await?)
    }

    /// Collect a [`StatusReport`]. Power and status are mandatory; the rest
    /// are left empty when the device reports them disabled.
    pub async fn report(&self) -> Result<StatusReport> {
        Ok(StatusReport {
            address: self.session.address().to_string(),
            power: self.power().await?,
            status: self.status().await?,
            mute: unless_disabled(self.mute().await)?,
            volume: unless_disabled(self.volume().await)?,
            light_source_mode: unless_disabled(self.light_source_mode().await)?,
            light_source_hours: unless_disabled(self.light_source_hours().await)?,
            temperature_c: unless_disabled(self.temperature().await)?,
        })
    }
}

fn unless_disabled<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_disabled() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Little-endian u32 record following the `0x34 0x00` read prefix.
///
/// Device-format assumption: four-byte records start after the same
/// two-byte prefix as the one- and two-byte reads. Decoding from offset 0
/// would fold the sub-address into the value.
fn le_u32(register: u16, payload: &[u8]) -> Result<u32> {
    let data = payload.get(READ_PREFIX_LEN..).unwrap_or_default();
    match data.get(..4) {
        Some(&[a, b, c, d]) => Ok(u32::from_le_bytes([a, b, c, d])),
        _ => Err(DeviceError::ShortRecord {
            register,
            expected: 4,
            received: data.len(),
        }),
    }
}
