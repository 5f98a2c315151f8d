/// Directories whose name starts with this prefix hold media plus sidecars.
pub const MARKER_DIR_PREFIX: &str = "Photos from";

pub const SIDECAR_EXTENSION: &str = ".json";

pub const OUTPUT_DIR_SUFFIX: &str = "__out";

pub const VIDEO_OUTPUT_DIR: &str = "videos";

pub const VALID_IMAGE_EXTENSIONS: &'static [&'static str] =
    &["jpg", "jpeg", "png", "gif", "webp", "bmp", "heic"];

pub const VALID_VIDEO_EXTENSIONS: &'static [&'static str] =
    &["mp4", "mov", "avi", "mkv", "webm", "3gp"];

/// Photos with these extensions are re-encoded, everything else is copied.
pub const JPEG_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg"];

pub const JPEG_QUALITY: u8 = 90;

/// Length of the shorter side after resizing.
pub const JPEG_MIN_SIDE: u32 = 1000;

pub const FFMPEG_PROGRAM: &str = "ffmpeg";

pub const VIDEO_SCALE_FILTER: &str = "scale=-2:720";
pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_PRESET: &str = "slow";
pub const VIDEO_CRF: &str = "28";
pub const VIDEO_BITRATE: &str = "1M";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "128k";

/// How much of ffmpeg's stderr is kept in a failure message.
pub const FFMPEG_STDERR_TAIL_LINES: usize = 5;
