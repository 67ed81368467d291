//! Border components

use super::Color;

/// Side of a cell a border edge is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl BorderSide {
    /// All sides in the element order `<border>` requires
    pub const ALL: [BorderSide; 4] = [
        BorderSide::Left,
        BorderSide::Right,
        BorderSide::Top,
        BorderSide::Bottom,
    ];

    pub fn xlsx_name(self) -> &'static str {
        match self {
            BorderSide::Left => "left",
            BorderSide::Right => "right",
            BorderSide::Top => "top",
            BorderSide::Bottom => "bottom",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One entry of the border pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    edges: [Option<BorderEdge>; 4],
}

impl BorderStyle {
    /// No edges; always pool entry 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Same edge on all four sides
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        Self {
            edges: [Some(BorderEdge::new(style, color)); 4],
        }
    }

    /// Set one side; a `None` line style clears it
    pub fn with(mut self, side: BorderSide, style: BorderLineStyle, color: Color) -> Self {
        self.edges[side.index()] = match style {
            BorderLineStyle::None => None,
            _ => Some(BorderEdge::new(style, color)),
        };
        self
    }

    pub fn with_left(self, style: BorderLineStyle, color: Color) -> Self {
        self.with(BorderSide::Left, style, color)
    }

    pub fn with_right(self, style: BorderLineStyle, color: Color) -> Self {
        self.with(BorderSide::Right, style, color)
    }

    pub fn with_top(self, style: BorderLineStyle, color: Color) -> Self {
        self.with(BorderSide::Top, style, color)
    }

    pub fn with_bottom(self, style: BorderLineStyle, color: Color) -> Self {
        self.with(BorderSide::Bottom, style, color)
    }

    pub fn edge(&self, side: BorderSide) -> Option<BorderEdge> {
        self.edges[side.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.edges.iter().all(Option::is_none)
    }

    /// Every side with its edge, in `<border>` element order
    pub fn edges(&self) -> impl Iterator<Item = (BorderSide, Option<BorderEdge>)> + '_ {
        BorderSide::ALL.into_iter().map(|side| (side, self.edge(side)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
}

impl BorderLineStyle {
    /// `style` attribute value
    pub fn xlsx_name(&self) -> &'static str {
        match self {
            BorderLineStyle::None => "none",
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
        }
    }
}
