//! Capture strategies and capability-gated strategy detection.
//!
//! A graphics context reports its [`Capabilities`]; [`available_strategies`]
//! turns those into the set of strategies that can run on it. An empty set
//! is a valid answer meaning capture is disabled, not an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Extension names that provide cross-sized framebuffer blits.
const BLIT_EXTENSIONS: &[&str] = &["GL_EXT_framebuffer_blit", "EXT_framebuffer_blit"];

/// All strategy names, in declaration order.
const STRATEGY_NAMES: &[&str] = &["blit"];

/// A concrete algorithm for reducing the host framebuffer.
///
/// Only `Blit` is implemented. Shader- and mipmap-based reductions are
/// extension points; adding one means a new variant here and a new
/// provider variant, with no change to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// GPU framebuffer blit into a small target, then readback.
    #[serde(alias = "Blit")]
    Blit,
}

impl Strategy {
    /// Returns a slice of all recognized strategy names.
    pub fn list_names() -> &'static [&'static str] {
        STRATEGY_NAMES
    }

    /// The lowercase name used in configuration and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Blit => "blit",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blit" => Ok(Strategy::Blit),
            _ => Err(format!(
                "unknown strategy '{s}' (expected one of: {})",
                STRATEGY_NAMES.join(", ")
            )),
        }
    }
}

/// Ordered, duplicate-free set of strategies.
pub type StrategySet = BTreeSet<Strategy>;

/// Graphics API version as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    /// `true` for OpenGL ES / WebGL.
    pub embedded: bool,
}

impl ApiVersion {
    /// Creates a desktop GL version.
    pub fn desktop(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            embedded: false,
        }
    }

    /// Creates a GLES / WebGL version.
    pub fn embedded(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            embedded: true,
        }
    }

    /// Returns `true` if this version is at least `major.minor`.
    pub fn at_least(self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Returns `true` if framebuffer blits with scaling are part of the core API.
    ///
    /// Both desktop GL 3.0 and GLES 3.0 include `glBlitFramebuffer`.
    pub fn has_native_blit(self) -> bool {
        self.at_least(3, 0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.embedded { "ES " } else { "" };
        write!(f, "{prefix}{}.{}", self.major, self.minor)
    }
}

/// What a graphics context can do, as far as capture is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The driver supports off-screen framebuffers at all.
    pub framebuffer_supported: bool,
    /// Off-screen framebuffers are enabled by the host (a host may turn them off).
    pub framebuffer_enabled: bool,
    pub version: ApiVersion,
    pub extensions: BTreeSet<String>,
}

impl Capabilities {
    /// Returns `true` if the named extension is advertised.
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Returns `true` if off-screen render targets can be used.
    pub fn framebuffers_usable(&self) -> bool {
        self.framebuffer_supported && self.framebuffer_enabled
    }

    /// Returns `true` if a cross-sized blit is available, natively or by extension.
    pub fn supports_scaled_blit(&self) -> bool {
        self.version.has_native_blit() || BLIT_EXTENSIONS.iter().any(|e| self.has_extension(e))
    }
}

/// Reports which capture strategies the given context supports.
///
/// Blit needs usable framebuffers plus either a blit extension or a base
/// API version that includes blits. No side effects.
pub fn available_strategies(caps: &Capabilities) -> StrategySet {
    let mut set = StrategySet::new();
    if caps.framebuffers_usable() && caps.supports_scaled_blit() {
        set.insert(Strategy::Blit);
    }
    set
}
