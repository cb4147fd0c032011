//! Inline style declarations and the handful of CSS values the face layout
//! understands (px lengths, hex colours, rotateY/translate transforms).

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    props: Vec<(String, String)>,
}

impl Style {
    /// Parse a `style="..."` attribute. Later declarations win.
    pub fn parse(css: &str) -> Self {
        let mut style = Style::default();
        for decl in css.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() && !value.is_empty() {
                    style.set(name, value);
                }
            }
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.props.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.props.push((name, value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.props.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn px(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(parse_px)
    }

    pub fn color(&self, name: &str) -> Option<Rgba> {
        self.get(name).and_then(parse_color)
    }

    pub fn to_css(&self) -> String {
        self.props
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub type Rgba = (u8, u8, u8, u8);

pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    if num.is_empty() || num.ends_with('%') {
        return None;
    }
    num.parse::<f32>().ok()
}

pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim();
    match v.to_ascii_lowercase().as_str() {
        "white" => return Some((255, 255, 255, 255)),
        "black" => return Some((0, 0, 0, 255)),
        "transparent" => return Some((0, 0, 0, 0)),
        _ => {}
    }
    let hex = v.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| channel(&format!("{c}{c}")));
            Some((it.next()??, it.next()??, it.next()??, 255))
        }
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 255)),
        8 => Some((
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        )),
        _ => None,
    }
}

/// Flat 2-D reading of a CSS transform: a horizontal mirror (rotateY past
/// 90deg shows the element from behind) plus a translation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceTransform {
    pub mirror_x: bool,
    pub dx: f32,
    pub dy: f32,
}

impl FaceTransform {
    pub fn is_identity(&self) -> bool {
        !self.mirror_x && self.dx == 0.0 && self.dy == 0.0
    }

    pub fn parse(value: &str) -> Self {
        let mut t = FaceTransform::default();
        let v = value.trim();
        if v.eq_ignore_ascii_case("none") {
            return t;
        }
        for func in v.split(')') {
            let Some((name, args)) = func.split_once('(') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let args: Vec<&str> = args.split(',').map(str::trim).collect();
            match name.as_str() {
                "rotatey" => {
                    if let Some(deg) = args.first().and_then(|a| parse_angle(a)) {
                        let turned = deg.rem_euclid(360.0);
                        if turned > 90.0 && turned < 270.0 {
                            t.mirror_x = !t.mirror_x;
                        }
                    }
                }
                "scalex" => {
                    if args.first().and_then(|a| a.parse::<f32>().ok()).unwrap_or(1.0) < 0.0 {
                        t.mirror_x = !t.mirror_x;
                    }
                }
                "translate" => {
                    t.dx += args.first().and_then(|a| parse_px(a)).unwrap_or(0.0);
                    t.dy += args.get(1).and_then(|a| parse_px(a)).unwrap_or(0.0);
                }
                "translatex" => t.dx += args.first().and_then(|a| parse_px(a)).unwrap_or(0.0),
                "translatey" => t.dy += args.first().and_then(|a| parse_px(a)).unwrap_or(0.0),
                _ => {}
            }
        }
        t
    }
}

fn parse_angle(value: &str) -> Option<f32> {
    let v = value.trim();
    if let Some(d) = v.strip_suffix("deg") {
        d.trim().parse().ok()
    } else if let Some(t) = v.strip_suffix("turn") {
        t.trim().parse::<f32>().ok().map(|t| t * 360.0)
    } else if let Some(r) = v.strip_suffix("rad") {
        r.trim().parse::<f32>().ok().map(f32::to_degrees)
    } else {
        v.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_override() {
        let mut s = Style::parse("width: 219px; background-color:#E53935;; transform: rotateY(180deg)");
        assert_eq!(s.px("width"), Some(219.0));
        assert_eq!(s.color("background-color"), Some((0xE5, 0x39, 0x35, 255)));
        s.set("transform", "none");
        assert_eq!(s.get("TRANSFORM"), Some("none"));
        s.remove("width");
        assert_eq!(s.px("width"), None);
        assert!(s.to_css().starts_with("background-color: #E53935"));
    }

    #[test]
    fn lengths_and_colors() {
        assert_eq!(parse_px("-9999px"), Some(-9999.0));
        assert_eq!(parse_px("100%"), None);
        assert_eq!(parse_color("#fff"), Some((255, 255, 255, 255)));
        assert_eq!(parse_color("#ffffff40"), Some((255, 255, 255, 0x40)));
        assert_eq!(parse_color("rebeccapurple"), None);
    }

    #[test]
    fn transforms() {
        assert!(FaceTransform::parse("rotateY(180deg)").mirror_x);
        assert!(!FaceTransform::parse("rotateY(360deg)").mirror_x);
        assert!(!FaceTransform::parse("rotateY(180deg) rotateY(180deg)").mirror_x);
        assert!(FaceTransform::parse("none").is_identity());
        let t = FaceTransform::parse("translate(10px, -4px) translateX(2px)");
        assert_eq!((t.dx, t.dy), (12.0, -4.0));
    }
}
