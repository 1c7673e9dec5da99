//! # Effect Invocations
//!
//! One request to show an effect, validated once at construction.
//!
//! ## Shape
//!
//! ```text
//! EffectInvocation
//!   ├─ descriptor   (&'static, from the catalog)
//!   ├─ motion       Spread(offsets) | Direction(vector)
//!   ├─ payload      None | Material(item/block) | Color(rgb/note)
//!   ├─ amount       >= 0
//!   └─ speed        >= 0, finite
//! ```
//!
//! Offsets and direction, and material and color, are sum types: an invocation
//! carrying both halves of either pair cannot exist. Payload kinds are checked
//! against the descriptor in [`InvocationBuilder::build`], so a wrong color
//! kind never reaches the encoder.

use ignis_shared::Vec3;

use crate::catalog::{ColorKind, DataKind, EffectDescriptor, EffectKind, InvocationShape};
use crate::error::{EffectError, EffectResult};

/// Material payload for crack and dust effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExtraData {
    kind: DataKind,
    material: u16,
    variant: u8,
}

impl ExtraData {
    /// Item texture payload.
    #[must_use]
    pub const fn item(material: u16, variant: u8) -> Self {
        Self {
            kind: DataKind::Item,
            material,
            variant,
        }
    }

    /// Block texture payload.
    #[must_use]
    pub const fn block(material: u16, variant: u8) -> Self {
        Self {
            kind: DataKind::Block,
            material,
            variant,
        }
    }

    /// Item or block.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.kind
    }

    /// Host material id.
    #[must_use]
    pub const fn material(&self) -> u16 {
        self.material
    }

    /// Material variant (damage / data value).
    #[must_use]
    pub const fn variant(&self) -> u8 {
        self.variant
    }

    /// The variant as the protocol reads it: a signed byte, so 200 is -56.
    #[must_use]
    pub const fn wire_variant(&self) -> i8 {
        i8::from_ne_bytes([self.variant])
    }

    /// The integer array written by the modern encoder.
    #[must_use]
    pub fn packet_data(&self) -> [i32; 2] {
        [i32::from(self.material), i32::from(self.wire_variant())]
    }

    /// The name suffix appended by the legacy encoder, e.g. `_35_14`.
    #[must_use]
    pub fn legacy_suffix(&self) -> String {
        format!("_{}_{}", self.material, self.wire_variant())
    }
}

/// Color payload for colorable effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectColor {
    /// Ordinary color.
    Rgb {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },
    /// Note-block pitch, 0 to 24.
    Note(u8),
}

impl EffectColor {
    /// Highest note index.
    pub const MAX_NOTE: u8 = 24;

    /// Builds an RGB color, rejecting channels outside 0..=255.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` naming the offending channel.
    pub fn rgb(red: i32, green: i32, blue: i32) -> EffectResult<Self> {
        Ok(Self::Rgb {
            red: channel("red", red)?,
            green: channel("green", green)?,
            blue: channel("blue", blue)?,
        })
    }

    /// Builds a note color, rejecting indices outside 0..=24.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when out of range.
    pub fn note(index: i32) -> EffectResult<Self> {
        match u8::try_from(index) {
            Ok(n) if n <= Self::MAX_NOTE => Ok(Self::Note(n)),
            _ => Err(EffectError::invalid(
                "note",
                format!("{index} is outside 0..={}", Self::MAX_NOTE),
            )),
        }
    }

    /// RGB or note.
    #[must_use]
    pub const fn kind(&self) -> ColorKind {
        match self {
            Self::Rgb { .. } => ColorKind::Rgb,
            Self::Note(_) => ColorKind::Note,
        }
    }

    /// The three values the color occupies in the offset slots.
    #[must_use]
    pub fn slot_values(&self) -> [f32; 3] {
        match *self {
            Self::Rgb { red, green, blue } => [
                f32::from(red) / 255.0,
                f32::from(green) / 255.0,
                f32::from(blue) / 255.0,
            ],
            Self::Note(n) => [f32::from(n) / f32::from(Self::MAX_NOTE), 0.0, 0.0],
        }
    }
}

fn channel(name: &'static str, value: i32) -> EffectResult<u8> {
    u8::try_from(value)
        .map_err(|_| EffectError::invalid(name, format!("{value} is outside 0..=255")))
}

/// How particles leave the emission point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Random spread within the given per-axis offsets.
    Spread(Vec3),
    /// A single particle flying along the given vector.
    Direction(Vec3),
}

/// Optional payload. At most one kind per invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Payload {
    /// Plain offset/amount effect.
    #[default]
    None,
    /// Item or block texture.
    Material(ExtraData),
    /// Color.
    Color(EffectColor),
}

/// Values an invocation contributes to the shared packet slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WireSlots {
    /// The three offset slots.
    pub offsets: [f32; 3],
    /// Speed slot.
    pub speed: f32,
    /// Amount slot.
    pub amount: i32,
}

/// A validated request to show an effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectInvocation {
    descriptor: &'static EffectDescriptor,
    motion: Motion,
    amount: i32,
    speed: f32,
    payload: Payload,
}

impl EffectInvocation {
    /// Starts a builder for `kind` with amount 1, speed 1 and no spread.
    #[must_use]
    pub fn builder(kind: EffectKind) -> InvocationBuilder {
        InvocationBuilder::new(kind.descriptor())
    }

    /// Turns this invocation back into a builder with the same values.
    #[must_use]
    pub fn to_builder(&self) -> InvocationBuilder {
        let mut builder = InvocationBuilder::new(self.descriptor);
        match self.motion {
            Motion::Spread(offset) => builder.offset = offset,
            Motion::Direction(direction) => builder.direction = Some(direction),
        }
        builder.amount = self.amount;
        builder.speed = self.speed;
        match self.payload {
            Payload::None => {}
            Payload::Material(data) => builder.extra_data = Some(data),
            Payload::Color(color) => builder.color = Some(color),
        }
        builder
    }

    /// The effect.
    #[must_use]
    pub const fn descriptor(&self) -> &'static EffectDescriptor {
        self.descriptor
    }

    /// Spread or direction.
    #[must_use]
    pub const fn motion(&self) -> Motion {
        self.motion
    }

    /// Particle count.
    #[must_use]
    pub const fn amount(&self) -> i32 {
        self.amount
    }

    /// Speed scalar.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Payload.
    #[must_use]
    pub const fn payload(&self) -> Payload {
        self.payload
    }

    /// Material payload, if any.
    #[must_use]
    pub const fn extra_data(&self) -> Option<ExtraData> {
        match self.payload {
            Payload::Material(data) => Some(data),
            _ => None,
        }
    }

    /// The parts of this invocation the capability flags care about.
    #[must_use]
    pub const fn shape(&self) -> InvocationShape {
        InvocationShape {
            directional: matches!(self.motion, Motion::Direction(_)),
            extra_data: match self.payload {
                Payload::Material(data) => Some(data.kind()),
                _ => None,
            },
            color: match self.payload {
                Payload::Color(color) => Some(color.kind()),
                _ => None,
            },
        }
    }

    /// Maps motion and payload onto the offset, speed and amount slots.
    ///
    /// Colors take the offset slots with speed 1 and amount 0; directions take
    /// them with the invocation's speed and amount 0.
    #[must_use]
    pub fn wire_slots(&self) -> WireSlots {
        if let Payload::Color(color) = self.payload {
            return WireSlots {
                offsets: color.slot_values(),
                speed: 1.0,
                amount: 0,
            };
        }
        match self.motion {
            Motion::Direction(direction) => WireSlots {
                offsets: direction.to_f32_array(),
                speed: self.speed,
                amount: 0,
            },
            Motion::Spread(offset) => WireSlots {
                offsets: offset.to_f32_array(),
                speed: self.speed,
                amount: self.amount,
            },
        }
    }
}

/// Builder for [`EffectInvocation`].
#[derive(Clone, Copy, Debug)]
pub struct InvocationBuilder {
    descriptor: &'static EffectDescriptor,
    offset: Vec3,
    direction: Option<Vec3>,
    amount: i32,
    speed: f32,
    extra_data: Option<ExtraData>,
    color: Option<EffectColor>,
}

impl InvocationBuilder {
    fn new(descriptor: &'static EffectDescriptor) -> Self {
        Self {
            descriptor,
            offset: Vec3::ZERO,
            direction: None,
            amount: 1,
            speed: 1.0,
            extra_data: None,
            color: None,
        }
    }

    /// Per-axis spread. Ignored when a direction is set.
    #[must_use]
    pub fn offset(mut self, x: f64, y: f64, z: f64) -> Self {
        self.offset = Vec3::new(x, y, z);
        self
    }

    /// Direction vector. The effect must be directional.
    #[must_use]
    pub fn direction(mut self, direction: Vec3) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Drops a previously set direction, going back to the spread.
    #[must_use]
    pub fn clear_direction(mut self) -> Self {
        self.direction = None;
        self
    }

    /// Particle count.
    #[must_use]
    pub fn amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    /// Speed scalar.
    #[must_use]
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Material payload.
    #[must_use]
    pub fn extra_data(mut self, data: ExtraData) -> Self {
        self.extra_data = Some(data);
        self
    }

    /// Color payload.
    #[must_use]
    pub fn color(mut self, color: EffectColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Validates and freezes the invocation.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a negative or non-finite speed, a negative
    ///   amount, non-finite vectors, or both material and color set
    /// - `UnsupportedEffect` when the shape does not fit the effect's flags
    pub fn build(self) -> EffectResult<EffectInvocation> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(EffectError::invalid(
                "speed",
                format!("{} is not a finite value >= 0", self.speed),
            ));
        }
        if self.amount < 0 {
            return Err(EffectError::invalid(
                "amount",
                format!("{} is lower than 0", self.amount),
            ));
        }

        let motion = match self.direction {
            Some(direction) if !direction.is_finite() => {
                return Err(EffectError::invalid("direction", "components must be finite"));
            }
            Some(direction) => Motion::Direction(direction),
            None if !self.offset.is_finite() => {
                return Err(EffectError::invalid("offset", "components must be finite"));
            }
            None => Motion::Spread(self.offset),
        };

        let payload = match (self.extra_data, self.color) {
            (Some(_), Some(_)) => {
                return Err(EffectError::invalid(
                    "payload",
                    "material data and color are mutually exclusive",
                ));
            }
            (Some(data), None) => Payload::Material(data),
            (None, Some(color)) => Payload::Color(color),
            (None, None) => Payload::None,
        };

        let invocation = EffectInvocation {
            descriptor: self.descriptor,
            motion,
            amount: self.amount,
            speed: self.speed,
            payload,
        };

        self.descriptor
            .check_shape(invocation.shape())
            .map_err(|reason| EffectError::UnsupportedEffect {
                effect: self.descriptor.name(),
                reason,
            })?;

        Ok(invocation)
    }
}
