use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

//decode errors for a single control frame, never fatal
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError{
    #[error("malformed control frame: expected 3 bytes, got {len}")]
    MalformedFrame{ len: usize },

    #[error("invalid gear value {0}")]
    InvalidGear(i8),
}

#[derive(Error, Debug)]
pub enum SimError{
    #[error("frame error {0}")]
    Frame(#[from] FrameError),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error {0}")]
    Serial(#[from] serialport::Error),

    #[error("config parse error {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("config error {0}")]
    Config(String),

    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind{
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("thread {name} panicked: {reason}")]
    ThreadPanicked{ name: &'static str, reason: String },
}

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::error::SimError::Config( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use config_error;

//problems found when checking a received sentence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentenceError{
    #[error("sentence does not start with '$'")]
    MissingStart,

    #[error("sentence has no '*HH' checksum suffix")]
    MissingChecksum,

    #[error("checksum mismatch: computed {computed:02X}, found {found}")]
    ChecksumMismatch{ computed: u8, found: String },
}
