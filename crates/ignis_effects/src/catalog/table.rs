//! The static effect table.
//!
//! One row per effect of the reference protocol, in protocol id order. The
//! numeric id of a row is its index; `EffectKind` discriminants match.

use super::{ColorKind, DataKind, EffectDescriptor, EffectFlags, EffectKind};

const DIR: EffectFlags = EffectFlags::DIRECTIONAL;
const LIQUID: EffectFlags = EffectFlags::REQUIRES_LIQUID_SURFACE;
const DATA: EffectFlags = EffectFlags::REQUIRES_EXTRA_DATA;
const COLOR: EffectFlags = EffectFlags::COLORABLE;
const NONE: EffectFlags = EffectFlags::NONE;

/// Every effect the engine knows, indexed by protocol id.
pub(super) static DESCRIPTORS: [EffectDescriptor; EffectKind::COUNT] = [
    EffectDescriptor::new(EffectKind::ExplosionNormal, "explode", None, DIR),
    EffectDescriptor::new(EffectKind::ExplosionLarge, "largeexplode", None, NONE),
    EffectDescriptor::new(EffectKind::ExplosionHuge, "hugeexplosion", None, NONE),
    EffectDescriptor::new(EffectKind::FireworksSpark, "fireworksSpark", None, DIR),
    EffectDescriptor::new(EffectKind::WaterBubble, "bubble", None, DIR.union(LIQUID)),
    EffectDescriptor::new(EffectKind::WaterSplash, "splash", None, DIR),
    EffectDescriptor::new(EffectKind::WaterWake, "wake", Some(7), DIR),
    EffectDescriptor::new(EffectKind::Suspended, "suspended", None, LIQUID),
    EffectDescriptor::new(EffectKind::SuspendedDepth, "depthSuspend", None, DIR),
    EffectDescriptor::new(EffectKind::Crit, "crit", None, DIR),
    EffectDescriptor::new(EffectKind::CritMagic, "magicCrit", None, DIR),
    EffectDescriptor::new(EffectKind::SmokeNormal, "smoke", None, DIR),
    EffectDescriptor::new(EffectKind::SmokeLarge, "largesmoke", None, DIR),
    EffectDescriptor::new(EffectKind::Spell, "spell", None, NONE),
    EffectDescriptor::new(EffectKind::SpellInstant, "instantSpell", None, NONE),
    EffectDescriptor::new(EffectKind::SpellMob, "mobSpell", None, COLOR).with_color(ColorKind::Rgb),
    EffectDescriptor::new(EffectKind::SpellMobAmbient, "mobSpellAmbient", None, COLOR)
        .with_color(ColorKind::Rgb),
    EffectDescriptor::new(EffectKind::SpellWitch, "witchMagic", None, NONE),
    EffectDescriptor::new(EffectKind::DripWater, "dripWater", None, NONE),
    EffectDescriptor::new(EffectKind::DripLava, "dripLava", None, NONE),
    EffectDescriptor::new(EffectKind::VillagerAngry, "angryVillager", None, NONE),
    EffectDescriptor::new(EffectKind::VillagerHappy, "happyVillager", None, DIR),
    EffectDescriptor::new(EffectKind::TownAura, "townaura", None, DIR),
    EffectDescriptor::new(EffectKind::Note, "note", None, COLOR).with_color(ColorKind::Note),
    EffectDescriptor::new(EffectKind::Portal, "portal", None, DIR),
    EffectDescriptor::new(EffectKind::EnchantmentTable, "enchantmenttable", None, DIR),
    EffectDescriptor::new(EffectKind::Flame, "flame", None, DIR),
    EffectDescriptor::new(EffectKind::Lava, "lava", None, NONE),
    EffectDescriptor::new(EffectKind::Footstep, "footstep", None, NONE),
    EffectDescriptor::new(EffectKind::Cloud, "cloud", None, DIR),
    EffectDescriptor::new(EffectKind::Redstone, "reddust", None, COLOR).with_color(ColorKind::Rgb),
    EffectDescriptor::new(EffectKind::Snowball, "snowballpoof", None, NONE),
    EffectDescriptor::new(EffectKind::SnowShovel, "snowshovel", None, DIR),
    EffectDescriptor::new(EffectKind::Slime, "slime", None, NONE),
    EffectDescriptor::new(EffectKind::Heart, "heart", None, NONE),
    EffectDescriptor::new(EffectKind::Barrier, "barrier", Some(8), NONE),
    EffectDescriptor::new(EffectKind::ItemCrack, "iconcrack", None, DIR.union(DATA))
        .with_data(DataKind::Item),
    EffectDescriptor::new(EffectKind::BlockCrack, "blockcrack", None, DIR.union(DATA))
        .with_data(DataKind::Block),
    EffectDescriptor::new(EffectKind::BlockDust, "blockdust", Some(7), DIR.union(DATA))
        .with_data(DataKind::Block),
    EffectDescriptor::new(EffectKind::WaterDrop, "droplet", Some(8), NONE),
    EffectDescriptor::new(EffectKind::ItemTake, "take", Some(8), NONE),
    EffectDescriptor::new(EffectKind::MobAppearance, "mobappearance", Some(8), NONE),
];
