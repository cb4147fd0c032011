//! Block layout for a single card face.
//!
//! Everything is in CSS pixels relative to the face's top-left corner. Text
//! uses an 8px bitmap font, so a line at `scale` is `8 * scale` wide per
//! character and `LINE_GAP * scale` tall.

use super::style::{FaceTransform, Rgba};
use super::{FaceChild, FaceNode};
use crate::CardSize;

pub const GLYPH: u32 = 8;
pub const LINE_GAP: u32 = 10;
const DEFAULT_PADDING: u32 = 16;
const DEFAULT_RADIUS: u32 = 12;
const BLOCK_SPACING: u32 = 8;
const CIRCLE_COLUMNS: u32 = 4;
const CIRCLE_GAP: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.margin + self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total)
    }
}

/// Role of a laid-out block, derived from the element's class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    QuoteIcon,
    Subtext,
    Quote,
    Footer,
    Circle,
    BackTitle,
    Paragraph,
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub text: String,
    pub elem_type: ElementType,
    pub scale: usize,
    pub color: Rgba,
}

/// A laid-out face plus the root-level styling the painter needs
#[derive(Debug, Clone)]
pub struct FaceLayout {
    pub width: u32,
    pub height: u32,
    pub background: Option<Rgba>,
    pub radius: u32,
    pub transform: FaceTransform,
    pub nodes: Vec<LayoutNode>,
}

pub fn line_height(scale: usize) -> u32 {
    LINE_GAP * scale as u32
}

/// Greedy word wrap at `max_chars` characters per line
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.chars().count() + word.chars().count() + 1 > max_chars && !cur.is_empty() {
            lines.push(cur);
            cur = word.to_string();
        } else {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

struct Cursor {
    x: i32,
    y: u32,
    content_width: u32,
    padding: u32,
}

impl Cursor {
    fn text_block(
        &mut self,
        nodes: &mut Vec<LayoutNode>,
        lines: &[String],
        elem_type: ElementType,
        scale: usize,
        color: Rgba,
    ) {
        let chars_per_line = (self.content_width / (GLYPH * scale as u32)).max(1) as usize;
        let wrapped: Vec<String> = lines
            .iter()
            .flat_map(|l| wrap_text(l, chars_per_line))
            .collect();
        if wrapped.is_empty() {
            return;
        }
        let height = wrapped.len() as u32 * line_height(scale);
        nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: self.x,
                    y: self.y as i32,
                    width: self.content_width,
                    height,
                },
                box_model: BoxModel {
                    margin: 0,
                    border: 0,
                    padding: self.padding,
                },
            },
            text: wrapped.join("\n"),
            elem_type,
            scale,
            color,
        });
        self.y += height + BLOCK_SPACING;
    }
}

/// Lay out a face. `fallback` supplies the size when the root has no px
/// width/height (percentage-sized live faces).
pub fn layout_face(root: &FaceNode, fallback: CardSize) -> FaceLayout {
    let width = root.style.px("width").map(|w| w.max(0.0) as u32).unwrap_or(fallback.width);
    let height = root.style.px("height").map(|h| h.max(0.0) as u32).unwrap_or(fallback.height);
    let padding = root.style.px("padding").map(|p| p.max(0.0) as u32).unwrap_or(DEFAULT_PADDING);
    let text_color = root.style.color("color").unwrap_or((255, 255, 255, 255));

    let mut transform = root
        .style
        .get("transform")
        .map(FaceTransform::parse)
        .unwrap_or_default();
    let positioned = matches!(
        root.style.get("position"),
        Some("absolute") | Some("fixed") | Some("relative")
    );
    if positioned {
        transform.dx += root.style.px("left").unwrap_or(0.0);
        transform.dy += root.style.px("top").unwrap_or(0.0);
    }

    let mut cursor = Cursor {
        x: padding as i32,
        y: padding,
        content_width: width.saturating_sub(padding * 2),
        padding,
    };
    let mut nodes = Vec::new();
    let mut footer: Option<&FaceNode> = None;

    for child in &root.children {
        let node = match child {
            FaceChild::Element(e) => e,
            FaceChild::Text(t) => {
                let lines = vec![t.trim().to_string()];
                cursor.text_block(&mut nodes, &lines, ElementType::Paragraph, 1, text_color);
                continue;
            }
            FaceChild::LineBreak => continue,
        };
        let color = node.style.color("color").unwrap_or(text_color);

        if node.has_class("quote-icon") {
            cursor.text_block(&mut nodes, &node.text_lines(), ElementType::QuoteIcon, 3, color);
        } else if node.has_class("card-content-quote") {
            for sub in node.elements().filter(|e| e.has_class("card-subtext")) {
                let mut c = sub.style.color("color").unwrap_or(color);
                c.3 = (c.3 as f32 * 0.8) as u8;
                cursor.text_block(&mut nodes, &sub.text_lines(), ElementType::Subtext, 1, c);
            }
            cursor.text_block(&mut nodes, &[node.own_text()], ElementType::Quote, 2, color);
        } else if node.has_class("card-footer") {
            footer = Some(node);
        } else if node.has_class("circles-grid") {
            layout_circles(&mut cursor, &mut nodes, node);
        } else if node.has_class("card-title-back") {
            cursor.text_block(&mut nodes, &node.text_lines(), ElementType::BackTitle, 2, color);
        } else {
            cursor.text_block(&mut nodes, &node.text_lines(), ElementType::Paragraph, 1, color);
        }
    }

    // Footer is pinned to the bottom edge
    if let Some(node) = footer {
        let mut lines: Vec<String> = node
            .elements()
            .flat_map(|e| e.text_lines())
            .collect();
        if lines.is_empty() {
            lines = node.text_lines();
        }
        let color = node.style.color("color").unwrap_or(text_color);
        let block_h = lines.len() as u32 * line_height(1);
        cursor.y = height.saturating_sub(padding + block_h);
        cursor.text_block(&mut nodes, &lines, ElementType::Footer, 1, color);
    }

    FaceLayout {
        width,
        height,
        background: root.style.color("background-color"),
        radius: root.style.px("border-radius").map(|r| r.max(0.0) as u32).unwrap_or(DEFAULT_RADIUS),
        transform,
        nodes,
    }
}

fn layout_circles(cursor: &mut Cursor, nodes: &mut Vec<LayoutNode>, grid: &FaceNode) {
    let circles: Vec<&FaceNode> = grid.elements().filter(|e| e.has_class("circle")).collect();
    if circles.is_empty() {
        return;
    }
    let diameter = cursor
        .content_width
        .saturating_sub(CIRCLE_GAP * (CIRCLE_COLUMNS - 1))
        / CIRCLE_COLUMNS;
    let step = diameter + CIRCLE_GAP;
    for (i, circle) in circles.iter().enumerate() {
        let col = i as u32 % CIRCLE_COLUMNS;
        let row = i as u32 / CIRCLE_COLUMNS;
        nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: cursor.x + (col * step) as i32,
                    y: (cursor.y + row * step) as i32,
                    width: diameter,
                    height: diameter,
                },
                box_model: BoxModel {
                    margin: 0,
                    border: 0,
                    padding: 0,
                },
            },
            text: String::new(),
            elem_type: ElementType::Circle,
            scale: 1,
            color: circle
                .style
                .color("background-color")
                .unwrap_or((255, 255, 255, 77)),
        });
    }
    let rows = (circles.len() as u32).div_ceil(CIRCLE_COLUMNS);
    cursor.y += rows * step + BLOCK_SPACING;
}
