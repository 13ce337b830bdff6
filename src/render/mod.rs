//! Display frames as plain draw primitives.
//!
//! A [`Frame`] is built fresh each cycle by [`layout::compose`] and committed by a
//! [`panel::Panel`]. Drawing goes through `embedded-graphics`, so any 2-bit
//! grayscale `DrawTarget` can receive it.

pub mod layout;
pub mod panel;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Gray2;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use embedded_graphics::text::{Baseline, Text, TextStyleBuilder};

pub use layout::{compose, Layout};

/// Panel width in pixels.
pub const WIDTH: u32 = 296;
/// Panel height in pixels.
pub const HEIGHT: u32 = 128;

pub const BLACK: Gray2 = Gray2::BLACK;
pub const DARK_GREY: Gray2 = Gray2::new(1);
pub const LIGHT_GREY: Gray2 = Gray2::new(2);
pub const WHITE: Gray2 = Gray2::WHITE;

/// A text label. `position` is the left edge at the vertical middle of the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Point,
    pub text: String,
    pub scale: u32,
    pub color: Gray2,
    pub background: Option<Gray2>,
}

/// A rectangle with optional fill and an inside stroke of `(color, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub top_left: Point,
    pub size: Size,
    pub fill: Option<Gray2>,
    pub stroke: Option<(Gray2, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Label(Label),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub background: Gray2,
    pub shapes: Vec<Shape>,
}

impl Label {
    pub fn new(x: i32, y: i32, text: impl Into<String>, scale: u32, color: Gray2) -> Self {
        Self {
            position: Point::new(x, y),
            text: text.into(),
            scale,
            color,
            background: None,
        }
    }

    /// The panel only carries bitmap fonts at two sizes; scale 1 is the 6x10
    /// terminal font, anything larger the 10x20 one.
    fn font(&self) -> &'static MonoFont<'static> {
        if self.scale <= 1 {
            &FONT_6X10
        } else {
            &FONT_10X20
        }
    }

    fn draw<D: DrawTarget<Color = Gray2>>(&self, target: &mut D) -> Result<(), D::Error> {
        let mut character_style = MonoTextStyleBuilder::new()
            .font(self.font())
            .text_color(self.color);
        if let Some(background) = self.background {
            character_style = character_style.background_color(background);
        }
        let text_style = TextStyleBuilder::new().baseline(Baseline::Middle).build();

        Text::with_text_style(
            &self.text,
            self.position,
            character_style.build(),
            text_style,
        )
        .draw(target)?;
        Ok(())
    }
}

impl Block {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            top_left: Point::new(x, y),
            size: Size::new(width, height),
            fill: None,
            stroke: None,
        }
    }

    #[must_use]
    pub fn fill(mut self, color: Gray2) -> Self {
        self.fill = Some(color);
        self
    }

    #[must_use]
    pub fn stroke(mut self, color: Gray2, width: u32) -> Self {
        self.stroke = Some((color, width));
        self
    }

    fn draw<D: DrawTarget<Color = Gray2>>(&self, target: &mut D) -> Result<(), D::Error> {
        let mut style = PrimitiveStyleBuilder::new().stroke_alignment(StrokeAlignment::Inside);
        if let Some(fill) = self.fill {
            style = style.fill_color(fill);
        }
        if let Some((color, width)) = self.stroke {
            style = style.stroke_color(color).stroke_width(width);
        }

        Rectangle::new(self.top_left, self.size)
            .into_styled(style.build())
            .draw(target)
    }
}

impl Frame {
    pub fn new(background: Gray2) -> Self {
        Self {
            background,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.shapes.iter().filter_map(|p| match p {
            Shape::Label(label) => Some(label),
            Shape::Block(_) => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.shapes.iter().filter_map(|p| match p {
            Shape::Block(block) => Some(block),
            Shape::Label(_) => None,
        })
    }

    /// Clear `target` to the background and draw every primitive in order; later
    /// primitives paint over earlier ones.
    pub fn draw<D: DrawTarget<Color = Gray2>>(&self, target: &mut D) -> Result<(), D::Error> {
        target.clear(self.background)?;
        for shape in &self.shapes {
            match shape {
                Shape::Label(label) => label.draw(target)?,
                Shape::Block(block) => block.draw(target)?,
            }
        }
        Ok(())
    }
}

impl From<Label> for Shape {
    fn from(label: Label) -> Self {
        Shape::Label(label)
    }
}

impl From<Block> for Shape {
    fn from(block: Block) -> Self {
        Shape::Block(block)
    }
}
