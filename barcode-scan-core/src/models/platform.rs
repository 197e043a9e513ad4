use std::fmt;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacingMode {
    /// Rear camera on phones and tablets.
    Environment,
    /// Front (selfie) camera.
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, other: &Resolution) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constraints handed to the platform camera API.
///
/// `None` fields leave the choice to the platform, so
/// `StreamConstraints::any_camera()` asks for any video device at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Option<FacingMode>,
    pub ideal: Option<Resolution>,
    pub max: Option<Resolution>,
    pub audio: bool,
}

impl StreamConstraints {
    pub fn preferred(facing: FacingMode, ideal: Resolution, max: Resolution) -> Self {
        Self {
            facing: Some(facing),
            ideal: Some(ideal),
            max: Some(max),
            audio: false,
        }
    }

    pub fn any_camera() -> Self {
        Self {
            facing: None,
            ideal: None,
            max: None,
            audio: false,
        }
    }

    pub fn is_constrained(&self) -> bool {
        self.facing.is_some() || self.ideal.is_some() || self.max.is_some()
    }
}

/// Kind of a media track inside a camera stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Identifies one acquired stream, so a sink can tell attachments apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

/// Raw failure reported by the platform camera API, a preview sink, or the
/// decode engine.
///
/// `name` carries the library's error identity (`NotAllowedError`,
/// `NotFoundException`, ...). It is only ever inspected by the classifier in
/// `processing::classify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub name: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for PlatformError {}
