//! Integration tests for validation, encoding and delivery.

use std::sync::Arc;

use ignis_effects::host::{
    ChannelSink, ClientRef, FixedRevision, LiquidSet, NoLiquid, RecordingSink, StaticDirectory,
};
use ignis_effects::protocol::EffectIdentity;
use ignis_effects::{
    ClientId, ColorKind, DataKind, DispatchFacade, EffectCatalog, EffectColor, EffectError,
    EffectFlags, EffectInvocation, EffectKind, ExtraData, ProtocolEra, Unsupported, Vec3,
    VisibilityFilter, WorldId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn facade_with(revision: &str, clients: Vec<ClientRef>) -> (DispatchFacade, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let facade = DispatchFacade::new(
        Arc::new(StaticDirectory::new(clients)),
        Arc::new(NoLiquid),
        sink.clone(),
        Arc::new(FixedRevision::new(revision)),
    );
    (facade, sink)
}

fn client_at(id: u32, x: f64, y: f64, z: f64) -> ClientRef {
    ClientRef::new(ClientId(id), WorldId::OVERWORLD, Vec3::new(x, y, z))
}

/// Independent statement of the capability rules.
fn expected_reason(
    flags: EffectFlags,
    accepts_data: Option<DataKind>,
    accepts_color: Option<ColorKind>,
    directional: bool,
    data: Option<DataKind>,
    color: Option<ColorKind>,
) -> Option<Unsupported> {
    if flags.contains(EffectFlags::REQUIRES_EXTRA_DATA) {
        match data {
            None => return Some(Unsupported::RequiresExtraData),
            Some(kind) if Some(kind) != accepts_data => {
                return Some(Unsupported::WrongExtraDataKind)
            }
            Some(_) => {}
        }
    } else if data.is_some() {
        return Some(Unsupported::UnexpectedExtraData);
    }
    if let Some(kind) = color {
        if !flags.contains(EffectFlags::COLORABLE) {
            return Some(Unsupported::NotColorable);
        }
        if Some(kind) != accepts_color {
            return Some(Unsupported::WrongColorKind);
        }
    }
    if directional && !flags.contains(EffectFlags::DIRECTIONAL) {
        return Some(Unsupported::NotDirectional);
    }
    None
}

#[test]
fn test_capability_gating_sweep() {
    let mut rng = StdRng::seed_from_u64(0x1617);
    let catalog = EffectCatalog::global();

    for _ in 0..2_000 {
        let id = rng.gen_range(0..u32::try_from(catalog.len()).unwrap());
        let descriptor = catalog.lookup_by_id(id).unwrap();
        let directional = rng.gen_bool(0.3);
        let data = match rng.gen_range(0..3) {
            0 => None,
            1 => Some(DataKind::Item),
            _ => Some(DataKind::Block),
        };
        let color = if data.is_some() {
            None
        } else {
            match rng.gen_range(0..3) {
                0 => None,
                1 => Some(ColorKind::Rgb),
                _ => Some(ColorKind::Note),
            }
        };

        let mut builder = EffectInvocation::builder(descriptor.kind());
        if directional {
            builder = builder.direction(Vec3::Y);
        }
        builder = match data {
            Some(DataKind::Item) => builder.extra_data(ExtraData::item(276, 0)),
            Some(DataKind::Block) => builder.extra_data(ExtraData::block(1, 2)),
            None => builder,
        };
        builder = match color {
            Some(ColorKind::Rgb) => builder.color(EffectColor::rgb(1, 2, 3).unwrap()),
            Some(ColorKind::Note) => builder.color(EffectColor::note(5).unwrap()),
            None => builder,
        };

        let expected = expected_reason(
            descriptor.flags(),
            descriptor.data_kind(),
            descriptor.color_kind(),
            directional,
            data,
            color,
        );
        let first = builder.build();
        let second = builder.build();
        assert_eq!(first, second, "gating must be deterministic");

        match expected {
            None => assert!(first.is_ok(), "{} rejected: {first:?}", descriptor.name()),
            Some(reason) => assert_eq!(
                first,
                Err(EffectError::UnsupportedEffect {
                    effect: descriptor.name(),
                    reason,
                })
            ),
        }
    }
}

#[test]
fn test_speed_and_amount_sweep() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let speed: f32 = rng.gen_range(-2.0..2.0);
        let amount: i32 = rng.gen_range(-3..10);
        let result = EffectInvocation::builder(EffectKind::Cloud)
            .speed(speed)
            .amount(amount)
            .build();
        if speed >= 0.0 && amount >= 0 {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(EffectError::InvalidParameter { .. })));
        }
    }
}

#[test]
fn test_radius_boundary() {
    let (facade, sink) = facade_with(
        "v1_8_R3",
        vec![
            client_at(1, 3.0, 4.0, 0.0),
            client_at(2, 5.0 + 1e-6, 0.0, 0.0),
            client_at(3, 0.0, 0.0, 0.0),
        ],
    );
    let flame = EffectInvocation::builder(EffectKind::Flame).build().unwrap();

    let report = facade
        .dispatch(&flame, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Radius(5.0))
        .unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(sink.receivers(), vec![ClientId(1), ClientId(3)]);
}

#[test]
fn test_long_distance_threshold() {
    let flame = EffectInvocation::builder(EffectKind::Flame).build().unwrap();

    let (facade, sink) = facade_with("v1_8_R3", vec![client_at(1, 256.0, 0.0, 0.0)]);
    let report = facade
        .dispatch(&flame, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();
    assert!(!report.long_distance);
    assert_eq!(sink.sent()[0].1.fields().unwrap().long_distance, Some(false));

    let (facade, sink) = facade_with("v1_8_R3", vec![client_at(1, 256.5, 0.0, 0.0)]);
    let report = facade
        .dispatch(&flame, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();
    assert!(report.long_distance);
    assert_eq!(sink.sent()[0].1.fields().unwrap().long_distance, Some(true));
}

#[test]
fn test_same_effect_in_both_eras() {
    let crack = EffectInvocation::builder(EffectKind::BlockDust)
        .extra_data(ExtraData::block(12, 3))
        .offset(0.1, 0.2, 0.3)
        .amount(4)
        .speed(0.5)
        .build()
        .unwrap();
    let center = Vec3::new(-8.0, 70.0, 12.5);

    let (legacy, legacy_sink) = facade_with("v1_7_R4", vec![client_at(1, 0.0, 70.0, 0.0)]);
    legacy
        .dispatch(&crack, WorldId::OVERWORLD, center, &VisibilityFilter::Everyone)
        .unwrap();
    let (modern, modern_sink) = facade_with("v1_10_R1", vec![client_at(1, 0.0, 70.0, 0.0)]);
    modern
        .dispatch(&crack, WorldId::OVERWORLD, center, &VisibilityFilter::Everyone)
        .unwrap();

    let legacy_packet = &legacy_sink.sent()[0].1;
    let modern_packet = &modern_sink.sent()[0].1;
    assert_eq!(legacy_packet.era(), ProtocolEra::Legacy);
    assert_eq!(modern_packet.era(), ProtocolEra::Modern);

    let legacy_fields = legacy_packet.fields().unwrap();
    let modern_fields = modern_packet.fields().unwrap();
    assert_eq!(legacy_fields.identity, EffectIdentity::Textual("blockdust_12_3".into()));
    assert_eq!(modern_fields.identity, EffectIdentity::Numeric(38));
    assert_eq!(modern_fields.data, vec![12, 3]);
    assert!(legacy_fields.data.is_empty());

    for fields in [&legacy_fields, &modern_fields] {
        assert_eq!(fields.position, [-8.0, 70.0, 12.5]);
        assert_eq!(fields.amount, 4);
        assert_eq!(fields.speed, 0.5);
    }
}

#[test]
fn test_high_variant_is_signed_on_the_wire() {
    let crack = EffectInvocation::builder(EffectKind::BlockCrack)
        .extra_data(ExtraData::block(35, 200))
        .build()
        .unwrap();

    let (legacy, legacy_sink) = facade_with("v1_7_R4", vec![client_at(1, 0.0, 0.0, 0.0)]);
    legacy
        .dispatch(&crack, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();
    let (modern, modern_sink) = facade_with("v1_8_R3", vec![client_at(1, 0.0, 0.0, 0.0)]);
    modern
        .dispatch(&crack, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();

    assert_eq!(
        legacy_sink.sent()[0].1.fields().unwrap().identity,
        EffectIdentity::Textual("blockcrack_35_-56".into())
    );
    assert_eq!(modern_sink.sent()[0].1.fields().unwrap().data, vec![35, -56]);
}

#[test]
fn test_note_color_slots() {
    let (facade, sink) = facade_with("v1_8_R3", vec![client_at(1, 0.0, 0.0, 0.0)]);
    let note = EffectInvocation::builder(EffectKind::Note)
        .color(EffectColor::note(6).unwrap())
        .amount(9)
        .build()
        .unwrap();
    facade
        .dispatch(&note, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();
    let fields = sink.sent()[0].1.fields().unwrap();
    assert_eq!(fields.offsets, [0.25, 0.0, 0.0]);
    assert_eq!(fields.speed, 1.0);
    assert_eq!(fields.amount, 0);
}

#[test]
fn test_liquid_required_for_suspended() {
    let sink = Arc::new(RecordingSink::new());
    let facade = DispatchFacade::new(
        Arc::new(StaticDirectory::new(vec![client_at(1, 0.0, 0.0, 0.0)])),
        Arc::new(LiquidSet::new().with_block(WorldId::OVERWORLD, Vec3::new(2.0, 60.0, 2.0))),
        sink.clone(),
        Arc::new(FixedRevision::new("v1_8_R3")),
    );
    let suspended = EffectInvocation::builder(EffectKind::Suspended).build().unwrap();

    assert_eq!(
        facade.dispatch(&suspended, WorldId(1), Vec3::new(2.0, 60.0, 2.0), &VisibilityFilter::Everyone),
        Err(EffectError::NotOverLiquid { effect: "suspended" })
    );
    assert!(facade
        .dispatch(&suspended, WorldId::OVERWORLD, Vec3::new(2.5, 60.5, 2.5), &VisibilityFilter::Everyone)
        .is_ok());
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_explicit_selection() {
    let (facade, sink) = facade_with(
        "v1_8_R3",
        vec![client_at(1, 0.0, 0.0, 0.0), client_at(2, 0.0, 0.0, 0.0)],
    );
    let heart = EffectInvocation::builder(EffectKind::Heart).build().unwrap();

    assert_eq!(
        facade.dispatch(&heart, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Explicit(Vec::new())),
        Err(EffectError::EmptyReceiverSet)
    );
    let report = facade
        .dispatch(
            &heart,
            WorldId::OVERWORLD,
            Vec3::ZERO,
            &VisibilityFilter::explicit([ClientId(2), ClientId(2)]),
        )
        .unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(sink.receivers(), vec![ClientId(2)]);
}

#[test]
fn test_channel_sink_reports_full_queue() {
    let (sink, rx) = ChannelSink::bounded(2);
    let facade = DispatchFacade::new(
        Arc::new(StaticDirectory::new(
            (1..=3).map(|i| client_at(i, 0.0, 0.0, 0.0)).collect(),
        )),
        Arc::new(NoLiquid),
        Arc::new(sink),
        Arc::new(FixedRevision::new("v1_8_R3")),
    );
    let flame = EffectInvocation::builder(EffectKind::Flame).build().unwrap();
    let report = facade
        .dispatch(&flame, WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
        .unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(rx.len(), 2);
}
