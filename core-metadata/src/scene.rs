//! Scene-release name cleanup
//!
//! Scene releases name files like `Artist.-.Title.2024.FLAC-GROUP`. The
//! cleanup is a fixed, ordered list of pure string rules applied to the file
//! stem; a known audio extension is detached first and re-attached last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extensions that are detached before cleanup and re-attached unchanged
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg", "opus", "wav", "aiff"];

static DOT_BEFORE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Za-z])").unwrap());

static RELEASE_GROUP_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-[A-Z0-9]{2,10}\s*$").unwrap());

static FORMAT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\s.\-]*\b(FLAC|MP3|AAC|OGG|WEB|CD|VINYL|SACD|HDCD|320|256|192|V0|V2|\d+bit|\d+kHz)\b",
    )
    .unwrap()
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A single cleanup rule
pub struct SceneRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Cleanup rules in application order
pub const SCENE_RULES: &[SceneRule] = &[
    SceneRule {
        name: "separators",
        apply: replace_separators,
    },
    SceneRule {
        name: "release_group",
        apply: strip_release_group,
    },
    SceneRule {
        name: "format_tags",
        apply: strip_format_tags,
    },
    SceneRule {
        name: "whitespace",
        apply: collapse_whitespace,
    },
];

/// Convert scene-release naming to a readable name
///
/// ```ignore
/// use core_metadata::scene::clean_scene_name;
///
/// assert_eq!(clean_scene_name("Blue.Monday.24bit.96kHz.flac"), "Blue Monday.flac");
/// ```
pub fn clean_scene_name(name: &str) -> String {
    let (stem, extension) = split_audio_extension(name);
    let cleaned = SCENE_RULES
        .iter()
        .fold(stem.to_string(), |acc, rule| (rule.apply)(&acc));
    format!("{}{}", cleaned, extension)
}

/// Split `name` into stem and `.ext` when the extension is a known audio one
fn split_audio_extension(name: &str) -> (&str, &str) {
    if let Some(dot) = name.rfind('.') {
        let ext = &name[dot + 1..];
        if AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return (&name[..dot], &name[dot..]);
        }
    }
    (name, "")
}

/// Dots followed by a letter, and underscores, become spaces
fn replace_separators(name: &str) -> String {
    DOT_BEFORE_LETTER
        .replace_all(name, " $1")
        .replace('_', " ")
}

/// Drop a trailing `-GROUP` tag (2-10 upper-case letters or digits)
fn strip_release_group(name: &str) -> String {
    RELEASE_GROUP_SUFFIX.replace(name, "").into_owned()
}

/// Drop format and quality markers together with their leading separators
fn strip_format_tags(name: &str) -> String {
    FORMAT_TAG.replace_all(name, " ").into_owned()
}

fn collapse_whitespace(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name, " ").trim().to_string()
}
