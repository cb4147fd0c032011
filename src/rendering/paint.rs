//! Paint commands for a laid-out face

use super::layout::{line_height, ElementType, FaceLayout, GLYPH};
use super::style::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    RoundedRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        rgba: Rgba,
    },
    Circle {
        x: i32,
        y: i32,
        diameter: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: usize,
        rgba: Rgba,
        mirrored: bool,
    },
}

/// Convert a face layout into paint commands, applying the root transform.
pub fn paint_face(layout: &FaceLayout) -> Vec<PaintCommand> {
    let t = layout.transform;
    let dx = t.dx.round() as i32;
    let dy = t.dy.round() as i32;
    // Mirror an x span [x, x + w) across the face's vertical centre line
    let place_x = |x: i32, w: u32| -> i32 {
        let x = if t.mirror_x {
            layout.width as i32 - x - w as i32
        } else {
            x
        };
        x + dx
    };

    let mut cmds = Vec::new();
    if let Some(rgba) = layout.background {
        cmds.push(PaintCommand::RoundedRect {
            x: place_x(0, layout.width),
            y: dy,
            width: layout.width,
            height: layout.height,
            radius: layout.radius,
            rgba,
        });
    }

    for node in &layout.nodes {
        let rect = &node.lb.rect;
        if node.elem_type == ElementType::Circle {
            cmds.push(PaintCommand::Circle {
                x: place_x(rect.x, rect.width),
                y: rect.y + dy,
                diameter: rect.width,
                rgba: node.color,
            });
            continue;
        }
        let lh = line_height(node.scale) as i32;
        for (i, line) in node.text.lines().enumerate() {
            let extent = line.chars().count() as u32 * GLYPH * node.scale as u32;
            cmds.push(PaintCommand::Text {
                x: place_x(rect.x, extent),
                y: rect.y + dy + i as i32 * lh,
                text: line.to_string(),
                scale: node.scale,
                rgba: node.color,
                mirrored: t.mirror_x,
            });
        }
    }
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{BoxModel, LayoutBox, LayoutNode, Rect};
    use crate::rendering::style::FaceTransform;

    fn one_line(transform: FaceTransform) -> FaceLayout {
        FaceLayout {
            width: 100,
            height: 50,
            background: Some((255, 0, 0, 255)),
            radius: 4,
            transform,
            nodes: vec![LayoutNode {
                lb: LayoutBox {
                    rect: Rect { x: 10, y: 5, width: 80, height: 10 },
                    box_model: BoxModel { margin: 0, border: 0, padding: 10 },
                },
                text: "ab".into(),
                elem_type: ElementType::Paragraph,
                scale: 1,
                color: (255, 255, 255, 255),
            }],
        }
    }

    #[test]
    fn identity_layout_paints_in_place() {
        let cmds = paint_face(&one_line(FaceTransform::default()));
        assert_eq!(cmds.len(), 2);
        match &cmds[1] {
            PaintCommand::Text { x, y, mirrored, .. } => {
                assert_eq!((*x, *y), (10, 5));
                assert!(!mirrored);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mirrored_layout_flips_text_span() {
        let t = FaceTransform { mirror_x: true, dx: 0.0, dy: 0.0 };
        let cmds = paint_face(&one_line(t));
        match &cmds[1] {
            // 100 - 10 - 16
            PaintCommand::Text { x, mirrored, .. } => {
                assert_eq!(*x, 74);
                assert!(mirrored);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
