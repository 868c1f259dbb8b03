use crate::config::LayoutConfig;

/// 實際筆畫 (ink) 的外框大小，單位 px
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockSize {
    pub width: i32,
    pub height: i32,
}

impl BlockSize {
    pub const EMPTY: BlockSize = BlockSize {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// 區塊左上角位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub date: Position,
    pub label: Position,
    pub lines: Vec<Position>,
}

pub fn centered_x(image_width: u32, text_width: i32) -> i32 {
    (image_width as i32 - text_width) / 2
}

/// 日期、餐別、菜單由上往下排，每個區塊都水平置中
pub fn compute_layout(
    image_width: u32,
    layout: &LayoutConfig,
    date: BlockSize,
    label: BlockSize,
    lines: &[BlockSize],
) -> LayoutPlan {
    let date_y = layout.title_y + layout.date_gap;
    let label_y = date_y + date.height + layout.label_gap;
    let body_y = label_y + label.height + layout.body_gap;

    LayoutPlan {
        date: Position {
            x: centered_x(image_width, date.width),
            y: date_y,
        },
        label: Position {
            x: centered_x(image_width, label.width),
            y: label_y,
        },
        lines: lines
            .iter()
            .enumerate()
            .map(|(i, size)| Position {
                x: centered_x(image_width, size.width),
                y: body_y + i as i32 * layout.line_height,
            })
            .collect(),
    }
}
