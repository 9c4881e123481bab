//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Stage retry policy defaults
pub mod retry {
    /// Default generative attempts per stage before falling back
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Temperature of the first attempt
    pub const BASE_TEMPERATURE: f32 = 0.3;

    /// Temperature increase per failed attempt
    pub const TEMPERATURE_STEP: f32 = 0.1;

    /// Temperature ceiling regardless of attempt count
    pub const MAX_TEMPERATURE: f32 = 1.0;
}

/// Prompt construction limits
pub mod prompt {
    /// Maximum characters of raw source text included in the content prompt
    pub const MAX_RAW_TEXT_CHARS: usize = 25_000;

    /// Maximum characters of raw text shown to the design stage
    pub const MAX_DESIGN_EXCERPT_CHARS: usize = 2_000;

    /// Maximum characters of upstream JSON echoed into a downstream prompt
    pub const MAX_UPSTREAM_JSON_CHARS: usize = 4_000;

    /// Maximum length of the user display name taken from the answers
    pub const MAX_USER_NAME_CHARS: usize = 50;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Default maximum output tokens per generative call
    pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 8192;
}

/// Known model control tokens stripped by the recovery engine.
///
/// Chat-turn delimiters and channel markers observed in raw completions
/// from local and hosted models.
pub const CONTROL_TOKENS: &[&str] = &[
    "<|channel|>",
    "<|constrain|>",
    "<|message|>",
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
];

/// CDN scripts the emitted site must reference.
///
/// The artifact is a single HTML file with no build step, so React, the
/// JSX transform, and styling all load from these.
pub mod cdn {
    pub const REACT: &str = "https://unpkg.com/react@18/umd/react.production.min.js";
    pub const REACT_DOM: &str = "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js";
    pub const BABEL_STANDALONE: &str = "https://unpkg.com/@babel/standalone/babel.min.js";
    pub const TAILWIND: &str = "https://cdn.tailwindcss.com";
    pub const FRAMER_MOTION: &str = "https://unpkg.com/framer-motion@10/dist/framer-motion.js";

    /// Scripts whose absence is a critical code-stage finding
    pub const REQUIRED: &[&str] = &[REACT, REACT_DOM, BABEL_STANDALONE];
}

/// Fixed catalogs for the deterministic mood derivation.
///
/// All three catalogs are indexed by the same input hash; their sizes are
/// deliberately coprime-ish so the combination space is large.
pub mod catalog {
    /// (primary, secondary, accent, background, text) hex tuples
    pub const COLOR_PALETTES: &[[&str; 5]] = &[
        ["#0071e3", "#1d1d1f", "#2997ff", "#000000", "#f5f5f7"],
        ["#FF6B6B", "#4ECDC4", "#FFE66D", "#1A1A2E", "#EAEAEA"],
        ["#6C5CE7", "#A29BFE", "#FD79A8", "#2D3436", "#DFE6E9"],
        ["#00B894", "#00CEC9", "#FDCB6E", "#0A0E27", "#F8F9FA"],
        ["#E17055", "#FDCB6E", "#74B9FF", "#FAF3E0", "#2D3436"],
        ["#FF3838", "#FF6348", "#FFC048", "#F5F5F5", "#1E272E"],
        ["#3742FA", "#5352ED", "#FF6348", "#FFFFFF", "#2F3542"],
        ["#2ECC71", "#27AE60", "#F39C12", "#ECF0F1", "#2C3E50"],
        ["#E91E63", "#9C27B0", "#00BCD4", "#1C1C1C", "#FFFFFF"],
        ["#FF9500", "#FF5722", "#4CAF50", "#FAFAFA", "#212121"],
        ["#607D8B", "#455A64", "#FF5722", "#ECEFF1", "#263238"],
        ["#1DE9B6", "#00E676", "#FFEA00", "#121212", "#E0E0E0"],
    ];

    /// (heading, body) font stacks
    pub const FONT_PAIRINGS: &[[&str; 2]] = &[
        ["Inter, sans-serif", "Inter, sans-serif"],
        ["Playfair Display, serif", "Lora, serif"],
        ["Space Grotesk, sans-serif", "Work Sans, sans-serif"],
        ["Syne, sans-serif", "DM Sans, sans-serif"],
        ["Archivo Black, sans-serif", "IBM Plex Sans, sans-serif"],
        ["Cormorant Garamond, serif", "Source Serif Pro, serif"],
        ["JetBrains Mono, monospace", "IBM Plex Mono, monospace"],
        ["Montserrat, sans-serif", "Open Sans, sans-serif"],
        ["Bebas Neue, sans-serif", "Roboto, sans-serif"],
        ["Crimson Text, serif", "Merriweather, serif"],
    ];

    /// Named visual directions
    pub const STYLE_LABELS: &[&str] = &[
        "Apple Minimalist",
        "Swiss Brutalist",
        "Editorial Magazine",
        "Tech Dashboard",
        "Creative Studio",
        "Luxury Fashion",
        "Cyberpunk",
        "Academic Clean",
        "Startup Modern",
        "Artistic Portfolio",
    ];
}
