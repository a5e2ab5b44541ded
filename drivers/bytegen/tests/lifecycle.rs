use bytegen::{ByteGen, DEVICE_COUNT, LoadError, NODE_MODE, NodeName};
use common::{Host, assert_clean, capture_logs, loaded, loaded_range, logged};
use device_api::DeviceId;
use devtmpfs::{DYNAMIC_MAJORS, FaultPlan, HostEvent};
use io_error::IOError;
use kdriver_api::{KernelInterface, insmod};

mod common;

fn load_err(host: &Host) -> LoadError {
    match ByteGen::load(host) {
        Ok(_) => panic!("load was expected to fail"),
        Err(e) => e,
    }
}

#[test]
fn load_materializes_every_byte() {
    let host = Host::new();
    let module = loaded(&host);

    assert_eq!(module.node_count(), DEVICE_COUNT as usize);
    assert!(module.missing().is_empty());
    assert_eq!(module.range(), loaded_range());
    assert_eq!(module.binding(), module.range());

    let nodes = host.nodes();
    assert_eq!(nodes.len(), 256);
    for (byte, node) in (0..=u8::MAX).zip(&nodes) {
        assert_eq!(node.path, NodeName::new(byte).path());
        assert_eq!(node.rdev, DeviceId::new(module.major(), byte.into()));
        assert_eq!(node.permissions, NODE_MODE);
        assert_eq!(node.class.as_deref(), Some("bytegen"));
    }
    assert_eq!(nodes[0].path, "bytegen/0x00");
    assert_eq!(nodes[255].path, "bytegen/0xff");

    let regions = host.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].name, "bytegen");
    assert_eq!(regions[0].range, module.range());
    assert_eq!(host.classes(), vec!["bytegen".to_string()]);

    module.unload();
}

#[test]
fn unload_leaves_nothing_behind() {
    let host = Host::new();
    loaded(&host).unload();
    assert_clean(&host);
    assert_eq!(host.open("bytegen/0x41").unwrap_err(), IOError::NotFound);
}

#[test]
fn allocation_failure_has_nothing_to_undo() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_region(IOError::Busy));

    let err = load_err(&host);
    assert_eq!(err, LoadError::Allocation(IOError::Busy));
    assert_eq!(err.errno(), -16);
    assert_clean(&host);
}

#[test]
fn no_free_major() {
    let host = Host::new();
    let total: usize = DYNAMIC_MAJORS.iter().map(|r| r.clone().count()).sum();
    let taken: Vec<_> = (0..total)
        .map(|i| host.alloc_chrdev_region(0, 1, &format!("hog{i}")).unwrap())
        .collect();

    assert_eq!(load_err(&host), LoadError::Allocation(IOError::Busy));
    assert_eq!(host.regions().len(), total);
    assert!(host.classes().is_empty());

    for range in taken {
        host.unregister_chrdev_region(range);
    }
    assert_clean(&host);
}

#[test]
fn class_failure_releases_numbers() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_class(IOError::OutOfMemory));

    let err = load_err(&host);
    assert_eq!(err, LoadError::ClassCreation(IOError::OutOfMemory));
    assert_eq!(err.errno(), -12);
    assert_clean(&host);
}

#[test]
fn class_name_already_taken() {
    let host = Host::new();
    let squatter = host.class_create("bytegen", None).unwrap();

    assert_eq!(
        load_err(&host),
        LoadError::ClassCreation(IOError::AlreadyExists)
    );
    assert!(host.regions().is_empty());
    assert!(host.nodes().is_empty());

    host.class_destroy(squatter);
    assert_clean(&host);
}

#[test]
fn binding_failure_releases_class_and_numbers() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_cdev(IOError::Busy));

    assert_eq!(load_err(&host), LoadError::Binding(IOError::Busy));
    assert_clean(&host);
}

#[test]
fn second_instance_unwinds_cleanly() {
    let host = Host::new();
    let first = loaded(&host);

    assert_eq!(
        load_err(&host),
        LoadError::ClassCreation(IOError::AlreadyExists)
    );
    assert_eq!(host.regions().len(), 1);
    assert_eq!(host.nodes().len(), 256);

    first.unload();
    assert_clean(&host);
}

#[test]
fn one_node_failing_keeps_the_rest() {
    capture_logs();
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_node("bytegen/0x10", IOError::OutOfMemory));

    let module = loaded(&host);
    assert_eq!(module.node_count(), 255);
    assert_eq!(module.missing(), &[NodeName::new(0x10)]);
    assert!(module.devices().all(|id| id.minor != 0x10));
    assert_eq!(host.open("bytegen/0x10").unwrap_err(), IOError::NotFound);

    for byte in (0..=u8::MAX).filter(|b| *b != 0x10) {
        let mut file = host.open(&NodeName::new(byte).path()).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(file.read(&mut buf), Ok(3));
        assert_eq!(buf, [byte; 3]);
    }

    let warnings = logged("cannot create device for 0x10");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("[WARN]"));

    module.unload();
    assert_clean(&host);
}

#[test]
fn reload_gets_the_same_layout() {
    let host = Host::new();
    let major = {
        let module = loaded(&host);
        let major = module.major();
        module.unload();
        major
    };
    let module = loaded(&host);
    assert_eq!(module.major(), major);
    assert_eq!(module.node_count(), 256);
    drop(module);
    assert_clean(&host);
}

#[test]
fn insmod_and_rmmod() {
    capture_logs();
    let host = Host::new();
    let module = insmod::<Host, ByteGen<'_, Host>>(&host).unwrap();
    assert_eq!(module.info().alias, "dev:bytegen");
    assert_eq!(module.info().license, "GPL");
    assert_eq!(module.node_count(), 256);

    module.rmmod();
    assert_clean(&host);
    assert!(!logged("Stopping driver [bytegen:1.0]").is_empty());
}

fn node_events(make: fn(String) -> HostEvent, skip: &[u8]) -> Vec<HostEvent> {
    (0..=u8::MAX)
        .filter(|b| !skip.contains(b))
        .map(|b| make(NodeName::new(b).path()))
        .collect()
}

fn class_created() -> HostEvent {
    HostEvent::ClassCreated("bytegen".into())
}

fn class_destroyed() -> HostEvent {
    HostEvent::ClassDestroyed("bytegen".into())
}

#[test]
fn load_acquires_in_order() {
    let host = Host::new();
    let module = loaded(&host);
    let range = loaded_range();

    let mut expected = vec![
        HostEvent::RegionReserved(range),
        class_created(),
        HostEvent::CdevAdded(range),
    ];
    expected.extend(node_events(HostEvent::NodeCreated, &[]));
    assert_eq!(host.take_events(), expected);

    module.unload();
}

#[test]
fn unload_releases_in_reverse_order() {
    capture_logs();
    let host = Host::new();
    let module = loaded(&host);
    let range = module.range();
    host.take_events();

    module.unload();

    let mut expected = node_events(HostEvent::NodeRemoved, &[]);
    expected.extend([
        HostEvent::CdevRemoved(range),
        class_destroyed(),
        HostEvent::RegionReleased(range),
    ]);
    assert_eq!(host.take_events(), expected);
    assert!(!logged("[bytegen]: loaded -> unloading").is_empty());
    assert!(!logged("[bytegen]: unloading -> unloaded").is_empty());
}

#[test]
fn dropping_the_module_releases_in_reverse_order() {
    let host = Host::new();
    let module = loaded(&host);
    let range = module.range();
    host.take_events();

    drop(module);

    let events = host.take_events();
    assert_eq!(events.len(), 256 + 3);
    assert_eq!(
        events[256..].to_vec(),
        vec![
            HostEvent::CdevRemoved(range),
            class_destroyed(),
            HostEvent::RegionReleased(range),
        ]
    );
}

#[test]
fn dropping_the_loaded_module_stops_it() {
    let host = Host::new();
    let module = insmod::<Host, ByteGen<'_, Host>>(&host).unwrap();
    let range = module.range();
    host.take_events();

    drop(module);

    let events = host.take_events();
    assert_eq!(events.len(), 256 + 3);
    assert_eq!(events.last(), Some(&HostEvent::RegionReleased(range)));
    assert_clean(&host);
}

#[test]
fn skipped_node_is_not_torn_down() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_node("bytegen/0x10", IOError::OutOfMemory));
    let module = loaded(&host);
    host.take_events();

    module.unload();

    let events = host.take_events();
    assert_eq!(
        events[..255].to_vec(),
        node_events(HostEvent::NodeRemoved, &[0x10])
    );
    assert_eq!(events.len(), 255 + 3);
}

#[test]
fn binding_failure_unwinds_class_then_region() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_cdev(IOError::Busy));

    assert_eq!(load_err(&host), LoadError::Binding(IOError::Busy));
    assert_eq!(
        host.take_events(),
        vec![
            HostEvent::RegionReserved(loaded_range()),
            class_created(),
            class_destroyed(),
            HostEvent::RegionReleased(loaded_range()),
        ]
    );
}

#[test]
fn class_failure_unwinds_region_only() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_class(IOError::OutOfMemory));

    assert_eq!(
        load_err(&host),
        LoadError::ClassCreation(IOError::OutOfMemory)
    );
    assert_eq!(
        host.take_events(),
        vec![
            HostEvent::RegionReserved(loaded_range()),
            HostEvent::RegionReleased(loaded_range()),
        ]
    );
}

#[test]
fn allocation_failure_touches_nothing() {
    let host = Host::new();
    host.set_faults(FaultPlan::new().fail_region(IOError::Busy));

    load_err(&host);
    assert!(host.events().is_empty());
}
