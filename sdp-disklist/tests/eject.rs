mod common;

use common::{Log, Op, unit, volume};
use sdp_disklist::{DiskSet, Error};

fn lock(n: &str) -> Op {
    Op::Lock(n.to_string())
}

fn dismount(n: &str) -> Op {
    Op::Dismount(n.to_string())
}

fn offline(n: &str) -> Op {
    Op::Offline(n.to_string())
}

#[test]
fn locks_all_before_dismounting() {
    let log = Log::default();
    let volumes = vec![
        volume(&log, "a", true, &[0]),
        volume(&log, "other", true, &[1]),
        volume(&log, "b", false, &[0]),
        volume(&log, "c", true, &[0]),
    ];
    let mut set = DiskSet::new(volumes, [unit(&log, 0)]);

    set.stop(0).unwrap();

    assert_eq!(
        *log.borrow(),
        [
            lock("a"),
            lock("b"),
            lock("c"),
            dismount("a"),
            dismount("c"),
            offline("a"),
            offline("b"),
            offline("c"),
            Op::Stop(0),
        ]
    );
    assert!(set.volumes_on(0).all(|v| v.locked));
    assert!(!set.volumes()[1].locked);
}

#[test]
fn lock_failure_aborts_before_stop() {
    let log = Log::default();
    let mut volumes = vec![
        volume(&log, "a", true, &[0]),
        volume(&log, "b", true, &[0]),
        volume(&log, "c", true, &[0]),
    ];
    volumes[1].handle.fail_lock = true;
    let mut set = DiskSet::new(volumes, [unit(&log, 0)]);

    let err = set.stop(0).unwrap_err();
    assert!(matches!(&err, Error::DiskInUse { disk: 0, volume } if volume == "b"));
    assert_eq!(err.to_string(), "Disk in use.");

    assert_eq!(*log.borrow(), [lock("a"), lock("b")]);
    // No rollback.
    assert!(set.volumes()[0].locked);
    assert!(!set.volumes()[1].locked);
}

#[test]
fn best_effort_steps_do_not_abort() {
    let log = Log::default();
    let mut volumes = vec![volume(&log, "a", true, &[3]), volume(&log, "b", true, &[3])];
    volumes[0].handle.fail_dismount = true;
    let mut set = DiskSet::new(volumes, [unit(&log, 3)]);

    set.stop(0).unwrap();
    assert_eq!(
        *log.borrow(),
        [
            lock("a"),
            lock("b"),
            dismount("a"),
            dismount("b"),
            offline("a"),
            offline("b"),
            Op::Stop(3),
        ]
    );
}

#[test]
fn spanned_volume_handled_once() {
    let log = Log::default();
    let volumes = vec![
        volume(&log, "span", true, &[0, 1]),
        volume(&log, "b", true, &[1]),
    ];
    let mut set = DiskSet::new(volumes, [unit(&log, 0), unit(&log, 1)]);
    assert!(set.volumes()[0].is_spanned());

    set.stop(0).unwrap();
    set.stop(1).unwrap();

    assert_eq!(
        *log.borrow(),
        [
            lock("span"),
            dismount("span"),
            offline("span"),
            Op::Stop(0),
            lock("b"),
            dismount("b"),
            offline("b"),
            Op::Stop(1),
        ]
    );
}

#[test]
fn disk_without_volumes() {
    let log = Log::default();
    let mut set = DiskSet::new(vec![volume(&log, "a", true, &[1])], [unit(&log, 2)]);

    set.eject(0).unwrap();
    assert!(log.borrow().is_empty());

    set.stop(0).unwrap();
    assert_eq!(*log.borrow(), [Op::Stop(2)]);
}

#[test]
fn later_disk_unaffected_by_failure() {
    let log = Log::default();
    let mut volumes = vec![volume(&log, "a", true, &[0]), volume(&log, "b", false, &[1])];
    volumes[0].handle.fail_lock = true;
    let mut set = DiskSet::new(volumes, [unit(&log, 0), unit(&log, 1)]);

    let results: Vec<_> = (0..set.disks().len()).map(|i| set.stop(i).is_ok()).collect();
    assert_eq!(results, [false, true]);
    assert_eq!(
        *log.borrow(),
        [lock("a"), lock("b"), offline("b"), Op::Stop(1)]
    );
}

#[test]
fn spanned_volume_left_locked_is_quiesced_by_next_disk() {
    let log = Log::default();
    let mut volumes = vec![
        volume(&log, "span", true, &[0, 1]),
        volume(&log, "busy", true, &[0]),
    ];
    volumes[1].handle.fail_lock = true;
    let mut set = DiskSet::new(volumes, [unit(&log, 0), unit(&log, 1)]);

    assert!(set.stop(0).is_err());
    assert!(set.volumes()[0].locked);
    assert!(!set.volumes()[0].quiesced);

    set.stop(1).unwrap();
    assert!(set.volumes()[0].quiesced);
    assert_eq!(
        *log.borrow(),
        [
            lock("span"),
            lock("busy"),
            dismount("span"),
            offline("span"),
            Op::Stop(1),
        ]
    );
}
