//! Text styling, placement, and animation selection.
//!
//! Submissions come from a web editor, so keys are camelCase with snake_case
//! aliases, and enum-like values are matched leniently: an unknown
//! animation or transform name falls back to `none` instead of failing the job.

use serde::{Deserialize, Deserializer, Serialize};

/// Visual style of a text track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font size in pixels.
    #[serde(rename = "fontSize", alias = "font_size")]
    pub font_size: f64,

    /// Fill color (hex, rgb()/rgba(), or a CSS color name).
    pub color: String,

    /// Font family, matched case-insensitively against the packaged fonts.
    #[serde(rename = "fontFamily", alias = "font_family")]
    pub font_family: String,

    /// Numeric CSS weight.
    #[serde(
        rename = "fontWeight",
        alias = "font_weight",
        deserialize_with = "deserialize_font_weight"
    )]
    pub font_weight: u16,

    /// Stroke color; `None` disables the stroke.
    #[serde(alias = "strokeColor", alias = "stroke_color")]
    pub stroke: Option<String>,

    /// Stroke width in pixels.
    #[serde(rename = "strokeWidth", alias = "stroke_width")]
    pub stroke_width: f64,

    /// Background fill behind the text block; transparent when `None`.
    #[serde(rename = "backgroundColor", alias = "background_color")]
    pub background_color: Option<String>,

    /// Case transform applied before layout.
    #[serde(rename = "textTransform", alias = "text_transform")]
    pub text_transform: TextTransform,

    /// Fractional canvas position of the text block's center.
    pub position: Position,

    /// Entrance or looping animation.
    pub animation: Animation,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 60.0,
            color: "#FFFFFF".to_string(),
            font_family: "Montserrat".to_string(),
            font_weight: 700,
            stroke: None,
            stroke_width: 0.0,
            background_color: None,
            text_transform: TextTransform::None,
            position: Position::default(),
            animation: Animation::None,
        }
    }
}

/// Widest stroke drawn, in pixels. Larger requests are clamped.
pub const MAX_STROKE_WIDTH: f64 = 40.0;

impl TextStyle {
    /// Stroke width actually drawn: zero when no stroke color is set, and
    /// never more than [`MAX_STROKE_WIDTH`].
    pub fn effective_stroke_width(&self) -> f64 {
        match &self.stroke {
            Some(color) if !color.trim().is_empty() && self.stroke_width > 0.0 => {
                self.stroke_width.min(MAX_STROKE_WIDTH)
            }
            _ => 0.0,
        }
    }
}

/// Fractional canvas coordinates `[0, 1]` of a layer's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Default for Position {
    /// Horizontally centered, near the bottom.
    fn default() -> Self {
        Self { x: 0.5, y: 0.8 }
    }
}

/// Case transform applied to caption text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
}

impl TextTransform {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "uppercase" => TextTransform::Uppercase,
            "lowercase" => TextTransform::Lowercase,
            _ => TextTransform::None,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
        }
    }
}

impl<'de> Deserialize<'de> for TextTransform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(TextTransform::parse).unwrap_or_default())
    }
}

/// Text animation selector.
///
/// Discriminants are stable: the animation strategy table is indexed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    #[default]
    None = 0,
    Fade = 1,
    SlideUp = 2,
    Pop = 3,
    Typewriter = 4,
    Bounce = 5,
    Shake = 6,
    Swing = 7,
    Glitch = 8,
}

impl Animation {
    /// Every variant, in discriminant order.
    pub const ALL: [Animation; 9] = [
        Animation::None,
        Animation::Fade,
        Animation::SlideUp,
        Animation::Pop,
        Animation::Typewriter,
        Animation::Bounce,
        Animation::Shake,
        Animation::Swing,
        Animation::Glitch,
    ];

    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "fade" | "fade_in" | "fadein" => Animation::Fade,
            "slide_up" | "slideup" => Animation::SlideUp,
            "pop" => Animation::Pop,
            "typewriter" => Animation::Typewriter,
            "bounce" => Animation::Bounce,
            "shake" => Animation::Shake,
            "swing" => Animation::Swing,
            "glitch" => Animation::Glitch,
            _ => Animation::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Animation::None => "none",
            Animation::Fade => "fade",
            Animation::SlideUp => "slide_up",
            Animation::Pop => "pop",
            Animation::Typewriter => "typewriter",
            Animation::Bounce => "bounce",
            Animation::Shake => "shake",
            Animation::Swing => "swing",
            Animation::Glitch => "glitch",
        }
    }
}

impl<'de> Deserialize<'de> for Animation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Animation::parse).unwrap_or_default())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFontWeight {
    Number(f64),
    Text(String),
}

fn deserialize_font_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let raw = Option::<RawFontWeight>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawFontWeight::Number(n)) => n.clamp(1.0, 1000.0) as u16,
        Some(RawFontWeight::Text(s)) => parse_font_weight(&s),
        None => 700,
    })
}

/// Parse a CSS font-weight value. Unrecognized values read as bold.
pub fn parse_font_weight(value: &str) -> u16 {
    let trimmed = value.trim().to_ascii_lowercase();
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.clamp(1.0, 1000.0) as u16;
    }
    match trimmed.as_str() {
        "thin" => 100,
        "light" => 300,
        "normal" | "regular" => 400,
        "medium" => 500,
        "semibold" => 600,
        "bold" => 700,
        "extrabold" => 800,
        "black" | "heavy" => 900,
        _ => 700,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position_is_bottom_center() {
        let style: TextStyle = serde_json::from_str("{}").unwrap();
        assert_eq!(style.position, Position { x: 0.5, y: 0.8 });
        assert_eq!(style.animation, Animation::None);
    }

    #[test]
    fn test_camel_and_snake_keys() {
        let camel: TextStyle =
            serde_json::from_str(r#"{"fontSize": 48, "fontFamily": "Anton", "strokeWidth": 6}"#)
                .unwrap();
        let snake: TextStyle =
            serde_json::from_str(r#"{"font_size": 48, "font_family": "Anton", "stroke_width": 6}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.font_size, 48.0);
    }

    #[test]
    fn test_font_weight_accepts_numbers_and_strings() {
        let n: TextStyle = serde_json::from_str(r#"{"fontWeight": 900}"#).unwrap();
        let s: TextStyle = serde_json::from_str(r#"{"fontWeight": "900"}"#).unwrap();
        let named: TextStyle = serde_json::from_str(r#"{"fontWeight": "normal"}"#).unwrap();
        assert_eq!(n.font_weight, 900);
        assert_eq!(s.font_weight, 900);
        assert_eq!(named.font_weight, 400);
    }

    #[test]
    fn test_unknown_animation_falls_back_to_none() {
        let style: TextStyle = serde_json::from_str(r#"{"animation": "wobble"}"#).unwrap();
        assert_eq!(style.animation, Animation::None);

        let slide: TextStyle = serde_json::from_str(r#"{"animation": "slide-up"}"#).unwrap();
        assert_eq!(slide.animation, Animation::SlideUp);
        assert_eq!(Animation::parse("fadeIn"), Animation::Fade);

        let null: TextStyle = serde_json::from_str(r#"{"animation": null}"#).unwrap();
        assert_eq!(null.animation, Animation::None);
    }

    #[test]
    fn test_animation_discriminants_follow_all() {
        for (idx, anim) in Animation::ALL.iter().enumerate() {
            assert_eq!(*anim as usize, idx);
            assert_eq!(Animation::parse(anim.as_str()), *anim);
        }
    }

    #[test]
    fn test_uppercase_transform() {
        let style: TextStyle = serde_json::from_str(r#"{"textTransform": "uppercase"}"#).unwrap();
        assert_eq!(style.text_transform.apply("hello world"), "HELLO WORLD");
    }

    #[test]
    fn test_stroke_without_color_is_not_drawn() {
        let style: TextStyle = serde_json::from_str(r#"{"strokeWidth": 6}"#).unwrap();
        assert_eq!(style.effective_stroke_width(), 0.0);

        let stroked: TextStyle =
            serde_json::from_str(r##"{"stroke": "#000000", "strokeWidth": 6}"##).unwrap();
        assert_eq!(stroked.effective_stroke_width(), 6.0);
    }

    #[test]
    fn test_stroke_width_is_clamped() {
        let style: TextStyle =
            serde_json::from_str(r##"{"stroke": "#000000", "strokeWidth": 160}"##).unwrap();
        assert_eq!(style.stroke_width, 160.0);
        assert_eq!(style.effective_stroke_width(), MAX_STROKE_WIDTH);
    }
}
