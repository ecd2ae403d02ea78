mod common;

use attributes_core::{
    AttributeChanger, AttributeCommandBuffer, AttributeError, EntityId, NotificationBuffers,
    NotificationTarget, StatModifier,
};
use common::{ARMOR, HEALTH, attr, init_tracing, world};

/// A producer records an aura before the affected entity exists, then picks up
/// the handle from its notification buffer once the entity is materialized.
#[test]
fn deferred_add_reports_its_handle_after_the_target_exists() {
    init_tracing();
    let (mut store, mut graph) = world(1, 10.0);
    let producer = EntityId(1);
    let target = attr(2, HEALTH);
    let mut notifications = NotificationBuffers::new();
    notifications.register(producer);

    let mut commands = AttributeCommandBuffer::new();
    commands.add_modifier_with_notification(
        target,
        StatModifier::add_attribute(attr(1, ARMOR), 1.0),
        NotificationTarget::new(producer, 42),
    );
    let replayed = commands.clone();

    // ================================================================
    // Too early: entity 2 has neither slots nor buffers
    // ================================================================
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    let report = commands.playback(&mut changer, &mut notifications);

    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.errors[0],
        AttributeError::StaleCommandTarget {
            command: "add_modifier",
            entity: EntityId(2),
        }
    ));
    assert!(notifications.pending(producer).is_empty());

    // ================================================================
    // Materialize entity 2 and replay the same recording
    // ================================================================
    graph.register_owner(EntityId(2));
    store.table.insert(target, 5.0);

    let mut commands = replayed;
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    let report = commands.playback(&mut changer, &mut notifications);
    assert!(report.is_clean());
    assert_eq!(store.value(target), Some(15.0));

    let received = notifications.drain(producer);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].correlation_id, 42);
    assert_eq!(received[0].reference.affected_attribute, target);

    // The reported handle is good for a later removal.
    let mut commands = AttributeCommandBuffer::new();
    commands.remove_modifier(received[0].reference);
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    let report = commands.playback(&mut changer, &mut notifications);

    assert_eq!(report.applied, 1);
    assert_eq!(store.value(target), Some(5.0));
    assert_eq!(graph.observer_count(target, attr(1, ARMOR)), 0);
}

/// Independent workers fill their own buffers; one serial phase replays them.
#[test]
fn buffers_from_parallel_producers_merge_into_one_playback() {
    let (mut store, mut graph) = world(4, 1.0);

    let mut buffers: Vec<AttributeCommandBuffer<StatModifier>> = std::thread::scope(|scope| {
        let workers: Vec<_> = (1..=4)
            .map(|entity| {
                scope.spawn(move || {
                    let mut buffer = AttributeCommandBuffer::new();
                    buffer.add_modifier(attr(entity, HEALTH), StatModifier::flat(entity as f32));
                    buffer.add_base_value(attr(entity, ARMOR), 1.0);
                    buffer
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("producer thread panicked"))
            .collect()
    });

    let mut merged = AttributeCommandBuffer::new();
    for buffer in &mut buffers {
        merged.append(buffer);
    }
    assert_eq!(merged.len(), 8);

    let mut notifications = NotificationBuffers::new();
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    let report = merged.playback(&mut changer, &mut notifications);

    assert_eq!(report.applied, 8);
    for entity in 1..=4 {
        assert_eq!(store.value(attr(entity, HEALTH)), Some(1.0 + entity as f32));
        assert_eq!(store.value(attr(entity, ARMOR)), Some(2.0));
    }
}

#[test]
fn scoped_removal_commands_recalculate() {
    let (mut store, mut graph) = world(2, 2.0);
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    changer
        .add_modifier(attr(1, HEALTH), StatModifier::more(100.0), true)
        .unwrap();
    changer
        .add_modifier(attr(1, ARMOR), StatModifier::add_attribute(attr(2, ARMOR), 1.0), true)
        .unwrap();
    assert_eq!(store.value(attr(1, HEALTH)), Some(4.0));
    assert_eq!(store.value(attr(1, ARMOR)), Some(4.0));

    let mut commands = AttributeCommandBuffer::new();
    commands.remove_all_modifiers_affecting_attribute(attr(1, HEALTH));
    commands.remove_all_modifiers_observing_attribute(EntityId(1), attr(2, ARMOR));
    commands.recalculate_all_observers(attr(2, ARMOR));

    let mut notifications = NotificationBuffers::new();
    let mut changer = AttributeChanger::new(&mut store, &mut graph);
    let report = commands.playback(&mut changer, &mut notifications);

    assert_eq!(report.applied, 3);
    assert_eq!(store.value(attr(1, HEALTH)), Some(2.0));
    assert_eq!(store.value(attr(1, ARMOR)), Some(2.0));
    assert!(graph.modifiers(EntityId(1)).unwrap().is_empty());
}
