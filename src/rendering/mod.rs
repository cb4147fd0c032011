//! Face rendering: detached face trees, layout, paint commands and the
//! software rasterizer that turns them into PNG snapshots.

pub mod layout;
pub mod paint;
pub mod raster;
pub mod style;

use crate::CardSize;
use scraper::{ElementRef, Node};
pub use style::{FaceTransform, Rgba, Style};

#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FaceChild {
    Element(FaceNode),
    Text(String),
    LineBreak,
}

/// An owned copy of an element subtree. Cloning a face out of a parsed
/// document yields one of these; mutating it never touches the document.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceNode {
    pub tag: String,
    pub classes: Vec<String>,
    pub style: Style,
    pub children: Vec<FaceChild>,
}

impl FaceNode {
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let classes = value
            .attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let style = value.attr("style").map(Style::parse).unwrap_or_default();

        let mut children = Vec::new();
        for child in element.children() {
            match child.value() {
                Node::Text(t) => {
                    let s: &str = t;
                    if !s.trim().is_empty() {
                        children.push(FaceChild::Text(s.to_string()));
                    }
                }
                Node::Element(e) if e.name().eq_ignore_ascii_case("br") => {
                    children.push(FaceChild::LineBreak);
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        children.push(FaceChild::Element(FaceNode::from_element(el)));
                    }
                }
                _ => {}
            }
        }

        Self {
            tag: value.name().to_string(),
            classes,
            style,
            children,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn elements(&self) -> impl Iterator<Item = &FaceNode> {
        self.children.iter().filter_map(|c| match c {
            FaceChild::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Text of direct text children only, whitespace collapsed
    pub fn own_text(&self) -> String {
        let joined = self
            .children
            .iter()
            .filter_map(|c| match c {
                FaceChild::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        collapse_whitespace(&joined)
    }

    /// All descendant text, split into lines at `<br>`
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = vec![String::new()];
        self.collect_lines(&mut lines);
        lines
            .into_iter()
            .map(|l| collapse_whitespace(&l))
            .filter(|l| !l.is_empty())
            .collect()
    }

    fn collect_lines(&self, lines: &mut Vec<String>) {
        for child in &self.children {
            match child {
                FaceChild::Text(t) => {
                    if let Some(last) = lines.last_mut() {
                        last.push(' ');
                        last.push_str(t);
                    }
                }
                FaceChild::LineBreak => lines.push(String::new()),
                FaceChild::Element(e) => e.collect_lines(lines),
            }
        }
    }

    /// Force the node into a flat, fixed-size rectangle: canonical size, no
    /// transform, no positioning offsets.
    pub fn neutralize(&mut self, size: CardSize) {
        self.style.set("width", &format!("{}px", size.width));
        self.style.set("height", &format!("{}px", size.height));
        self.style.set("transform", "none");
        self.style.set("position", "static");
        self.style.set("box-sizing", "border-box");
        for prop in ["left", "top", "right", "bottom", "margin"] {
            self.style.remove(prop);
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first(html: &str, sel: &str) -> FaceNode {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(sel).unwrap();
        FaceNode::from_element(doc.select(&sel).next().unwrap())
    }

    #[test]
    fn clone_keeps_classes_style_and_breaks() {
        let node = first(
            r#"<div class="card-face card-back-rotated" style="transform: rotateY(180deg)"><div class="card-title-back">THING<br>FROM<br/>THE FUTURE</div></div>"#,
            ".card-face",
        );
        assert!(node.has_class("card-back-rotated"));
        assert_eq!(node.style.get("transform"), Some("rotateY(180deg)"));
        let title = node.elements().next().unwrap();
        assert_eq!(title.text_lines(), vec!["THING", "FROM", "THE FUTURE"]);
    }

    #[test]
    fn neutralize_clears_transform_and_offsets() {
        let mut node = first(
            r#"<div class="f" style="position: fixed; left: -9999px; top: 0; transform: rotateY(180deg); background-color: #43A047"></div>"#,
            ".f",
        );
        node.neutralize(CardSize::default());
        assert_eq!(node.style.get("transform"), Some("none"));
        assert_eq!(node.style.get("left"), None);
        assert_eq!(node.style.px("width"), Some(219.0));
        assert_eq!(node.style.px("height"), Some(332.0));
        assert_eq!(node.style.get("background-color"), Some("#43A047"));
    }

    #[test]
    fn own_text_skips_nested_elements() {
        let node = first(
            r#"<div class="q"><span class="card-subtext">Growth</span>  In 10
            years </div>"#,
            ".q",
        );
        assert_eq!(node.own_text(), "In 10 years");
        assert_eq!(node.text_lines(), vec!["Growth In 10 years"]);
    }
}
