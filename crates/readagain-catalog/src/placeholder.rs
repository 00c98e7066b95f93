//! Generated stand-in cover images.

use serde::{Deserialize, Serialize};

/// Width and height used for cover placeholders in "read again" lists.
pub const COVER_WIDTH: u32 = 80;
pub const COVER_HEIGHT: u32 = 120;

/// URL of a placeholder cover labelled with the first word of `title`.
pub fn placeholder_url(base: &str, title: &str) -> String {
    let label = title.split_whitespace().next().unwrap_or("Book");
    format!(
        "{base}?height={COVER_HEIGHT}&width={COVER_WIDTH}&text={}",
        urlencoding::encode(label)
    )
}

/// A flat SVG rectangle with centred text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderImage {
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub background: String,
    pub color: String,
}

impl Default for PlaceholderImage {
    fn default() -> Self {
        Self {
            width: 200,
            height: 300,
            text: "Placeholder".to_string(),
            background: "#f3f4f6".to_string(),
            color: "#6b7280".to_string(),
        }
    }
}

impl PlaceholderImage {
    pub const CONTENT_TYPE: &'static str = "image/svg+xml";

    pub fn font_size(&self) -> f64 {
        f64::from(self.width.min(self.height)) * 0.15
    }

    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        format!(
            r##"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">
  <rect width="{w}" height="{h}" fill="{bg}" stroke="#e5e7eb" stroke-width="1"/>
  <text x="{cx}" y="{cy}" font-family="Arial, sans-serif" font-size="{fs}" text-anchor="middle" dominant-baseline="middle" fill="{fg}" font-weight="500">{text}</text>
</svg>
"##,
            bg = escape_xml(&self.background),
            fg = escape_xml(&self.color),
            cx = f64::from(w) / 2.0,
            cy = f64::from(h) / 2.0,
            fs = self.font_size(),
            text = escape_xml(&self.text),
        )
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
