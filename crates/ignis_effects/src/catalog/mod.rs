//! # Effect Catalog
//!
//! Static registry of every effect the engine can emit.
//!
//! ## Design
//!
//! - Descriptors live in a `static` table; nothing mutates them
//! - Name lookup goes through a case-folded index built once on first use
//! - Id lookup is a bounds-checked array index
//!
//! ```text
//! EffectKind ──► DESCRIPTORS[id] ◄── lookup_by_id(id)
//!                      ▲
//!                      └──────────── lookup_by_name("Flame")
//! ```

mod table;

use std::collections::HashMap;
use std::ops::BitOr;
use std::sync::OnceLock;

use crate::error::Unsupported;
use table::DESCRIPTORS;

/// Capability flags of an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EffectFlags(u8);

impl EffectFlags {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// Flag: needs a material payload (item or block).
    pub const REQUIRES_EXTRA_DATA: Self = Self(1 << 0);
    /// Flag: only shown when the center is a liquid surface.
    pub const REQUIRES_LIQUID_SURFACE: Self = Self(1 << 1);
    /// Flag: accepts a direction vector instead of an offset spread.
    pub const DIRECTIONAL: Self = Self(1 << 2);
    /// Flag: accepts a color payload.
    pub const COLORABLE: Self = Self(1 << 3);

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if every flag of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for EffectFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Sub-kind of material payload an effect accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Item texture (item crack).
    Item,
    /// Block texture (block crack, block dust).
    Block,
}

/// Sub-kind of color an effect accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorKind {
    /// Ordinary red/green/blue triple.
    Rgb,
    /// Note-block pitch index.
    Note,
}

/// Symbolic identity of every effect. Discriminants are protocol ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum EffectKind {
    ExplosionNormal = 0,
    ExplosionLarge = 1,
    ExplosionHuge = 2,
    FireworksSpark = 3,
    WaterBubble = 4,
    WaterSplash = 5,
    WaterWake = 6,
    Suspended = 7,
    SuspendedDepth = 8,
    Crit = 9,
    CritMagic = 10,
    SmokeNormal = 11,
    SmokeLarge = 12,
    Spell = 13,
    SpellInstant = 14,
    SpellMob = 15,
    SpellMobAmbient = 16,
    SpellWitch = 17,
    DripWater = 18,
    DripLava = 19,
    VillagerAngry = 20,
    VillagerHappy = 21,
    TownAura = 22,
    Note = 23,
    Portal = 24,
    EnchantmentTable = 25,
    Flame = 26,
    Lava = 27,
    Footstep = 28,
    Cloud = 29,
    Redstone = 30,
    Snowball = 31,
    SnowShovel = 32,
    Slime = 33,
    Heart = 34,
    Barrier = 35,
    ItemCrack = 36,
    BlockCrack = 37,
    BlockDust = 38,
    WaterDrop = 39,
    ItemTake = 40,
    MobAppearance = 41,
}

impl EffectKind {
    /// Number of effects in the catalog.
    pub const COUNT: usize = 42;

    /// The descriptor for this effect.
    #[inline]
    #[must_use]
    pub fn descriptor(self) -> &'static EffectDescriptor {
        &DESCRIPTORS[self as usize]
    }
}

/// What an invocation asks of an effect, reduced to the parts the
/// capability flags care about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvocationShape {
    /// A direction vector is supplied.
    pub directional: bool,
    /// Kind of material payload, if any.
    pub extra_data: Option<DataKind>,
    /// Kind of color payload, if any.
    pub color: Option<ColorKind>,
}

/// Immutable description of one effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectDescriptor {
    kind: EffectKind,
    name: &'static str,
    min_version: Option<u8>,
    flags: EffectFlags,
    data_kind: Option<DataKind>,
    color_kind: Option<ColorKind>,
}

impl EffectDescriptor {
    const fn new(
        kind: EffectKind,
        name: &'static str,
        min_version: Option<u8>,
        flags: EffectFlags,
    ) -> Self {
        Self {
            kind,
            name,
            min_version,
            flags,
            data_kind: None,
            color_kind: None,
        }
    }

    const fn with_data(mut self, kind: DataKind) -> Self {
        self.data_kind = Some(kind);
        self
    }

    const fn with_color(mut self, kind: ColorKind) -> Self {
        self.color_kind = Some(kind);
        self
    }

    /// Symbolic id.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Textual protocol name (legacy identity).
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric protocol id (modern identity).
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u8 {
        self.kind as u8
    }

    /// Minimum protocol minor version, `None` when always supported.
    #[inline]
    #[must_use]
    pub const fn min_version(&self) -> Option<u8> {
        self.min_version
    }

    /// Capability flags.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> EffectFlags {
        self.flags
    }

    /// Returns true if every flag of `flag` is set on this effect.
    #[inline]
    #[must_use]
    pub const fn has(&self, flag: EffectFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Material payload kind accepted, if the effect requires one.
    #[inline]
    #[must_use]
    pub const fn data_kind(&self) -> Option<DataKind> {
        self.data_kind
    }

    /// Color kind accepted, if the effect is colorable.
    #[inline]
    #[must_use]
    pub const fn color_kind(&self) -> Option<ColorKind> {
        self.color_kind
    }

    /// Returns true if a server speaking protocol `1.<minor>` can show this effect.
    #[inline]
    #[must_use]
    pub const fn is_supported_on(&self, minor: u8) -> bool {
        match self.min_version {
            Some(required) => minor >= required,
            None => true,
        }
    }

    /// Checks an invocation shape against the capability flags.
    ///
    /// The checks run in a fixed order (material data, color, direction) so
    /// the same shape always yields the same reason.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found.
    pub fn check_shape(&self, shape: InvocationShape) -> Result<(), Unsupported> {
        if self.has(EffectFlags::REQUIRES_EXTRA_DATA) {
            match shape.extra_data {
                None => return Err(Unsupported::RequiresExtraData),
                Some(kind) if Some(kind) != self.data_kind => {
                    return Err(Unsupported::WrongExtraDataKind);
                }
                Some(_) => {}
            }
        } else if shape.extra_data.is_some() {
            return Err(Unsupported::UnexpectedExtraData);
        }

        if let Some(color) = shape.color {
            if !self.has(EffectFlags::COLORABLE) {
                return Err(Unsupported::NotColorable);
            }
            if Some(color) != self.color_kind {
                return Err(Unsupported::WrongColorKind);
            }
        }

        if shape.directional && !self.has(EffectFlags::DIRECTIONAL) {
            return Err(Unsupported::NotDirectional);
        }

        Ok(())
    }
}

/// Read-only lookup tables over the static descriptors.
pub struct EffectCatalog {
    by_name: HashMap<String, EffectKind>,
}

static GLOBAL: OnceLock<EffectCatalog> = OnceLock::new();

impl EffectCatalog {
    fn build() -> Self {
        let by_name = DESCRIPTORS
            .iter()
            .map(|d| (d.name.to_ascii_lowercase(), d.kind))
            .collect();
        Self { by_name }
    }

    /// The process-wide catalog. Built on first call, read-only afterwards.
    #[must_use]
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::build)
    }

    /// Finds an effect by protocol name, ignoring ASCII case.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<&'static EffectDescriptor> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|kind| kind.descriptor())
    }

    /// The descriptor of a known effect.
    #[must_use]
    pub fn descriptor(&self, kind: EffectKind) -> &'static EffectDescriptor {
        kind.descriptor()
    }

    /// Finds an effect by numeric protocol id.
    #[must_use]
    pub fn lookup_by_id(&self, id: u32) -> Option<&'static EffectDescriptor> {
        usize::try_from(id).ok().and_then(|i| DESCRIPTORS.get(i))
    }

    /// All descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &'static EffectDescriptor> {
        DESCRIPTORS.iter()
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        DESCRIPTORS.len()
    }

    /// Always false; the catalog is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        DESCRIPTORS.is_empty()
    }
}
