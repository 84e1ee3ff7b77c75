use chronicle::actor::{
    TrafficLightState, VehicleAckermannControl, VehicleFailureState, VehicleLightState,
    WalkerControl,
};
use chronicle::episode::Surface;
use chronicle::packet::HEADER_LEN;
use chronicle::{
    ActorId, ControllerId, Episode, LogReader, LogWriter, Packet, PacketKind, PlaybackConfig,
    Recorder, RecorderConfig, RecorderError, Replayer, SessionInfo, SpawnClass, StructuralError,
    Transform, VehicleWheels, WheelLocation, WheelSample, World,
};
use glam::{DVec3, Vec3};

fn spawn_at(world: &mut World, class: &str, x: f32) -> ActorId {
    world
        .spawn(
            &SpawnClass::new(class),
            &Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
        )
        .unwrap()
}

fn record(world: &World, frames: u32) -> Vec<u8> {
    let config = RecorderConfig {
        map_name: "Town04".into(),
        ..Default::default()
    };
    let mut recorder = Recorder::create(Vec::new(), config, 1_700_000_000).unwrap();
    for i in 0..frames {
        recorder.record_frame(world, i as f64 * 0.05).unwrap();
    }
    recorder.finish().unwrap()
}

fn wheel_packets(bytes: &[u8]) -> Vec<Vec<VehicleWheels>> {
    let mut reader = LogReader::open(bytes).unwrap();
    let mut found = Vec::new();
    while let Some(frame) = reader.next_frame().unwrap() {
        for packet in frame.packets {
            if let Packet::VehicleWheels(wheels) = packet {
                found.push(wheels);
            }
        }
    }
    found
}

#[test]
fn two_vehicles_with_four_wheels() {
    let mut world = World::new();
    let first = spawn_at(&mut world, "vehicle.tesla.model3", 0.0);
    let second = spawn_at(&mut world, "vehicle.lincoln.mkz", 10.0);
    world
        .actor_mut(second)
        .unwrap()
        .vehicle_mut()
        .unwrap()
        .pose_wheels(&[WheelSample::new(WheelLocation::FrontLeft, 0.3, 12.5)]);

    let bytes = record(&world, 1);
    let packets = wheel_packets(&bytes);
    assert_eq!(packets.len(), 1);

    let vehicles = &packets[0];
    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].database_id, first.id());
    assert_eq!(vehicles[1].database_id, second.id());
    assert!(vehicles.iter().all(|v| v.wheels.len() == 4));
    assert_eq!(
        vehicles[1].wheels[0],
        WheelSample::new(WheelLocation::FrontLeft, 0.3, 12.5)
    );
}

#[test]
fn empty_wheel_lists() {
    let mut writer = LogWriter::create(Vec::new(), &SessionInfo::default()).unwrap();
    writer.begin_frame(0.0).unwrap();
    writer
        .write_packet::<VehicleWheels>(PacketKind::VehicleWheels, &[])
        .unwrap();
    writer
        .write_packet(
            PacketKind::VehicleWheels,
            &[VehicleWheels {
                database_id: 5,
                wheels: Vec::new(),
            }],
        )
        .unwrap();
    writer.end_frame().unwrap();
    let bytes = writer.into_inner();

    assert_eq!(
        wheel_packets(&bytes),
        vec![
            Vec::new(),
            vec![VehicleWheels {
                database_id: 5,
                wheels: Vec::new()
            }]
        ]
    );
}

#[test]
fn truncated_log_is_structural() {
    let mut world = World::new();
    spawn_at(&mut world, "vehicle.audi.tt", 0.0);
    let mut bytes = record(&world, 1);

    // The last packet of the only frame is the wheels packet.
    let declared_end = bytes.len();
    bytes.truncate(declared_end - 2);

    let mut reader = LogReader::open(bytes.as_slice()).unwrap();
    let err = reader.next_frame().unwrap_err();
    match err {
        RecorderError::Structural(StructuralError::Truncated { tag, declared, read }) => {
            assert_eq!(tag, PacketKind::VehicleWheels.tag());
            assert_eq!(read + 2, declared as u64);
        }
        other => panic!("expected truncation, got {other}"),
    }
}

#[test]
fn wheels_packet_length_covers_payload() {
    let mut world = World::new();
    spawn_at(&mut world, "vehicle.audi.tt", 0.0);
    spawn_at(&mut world, "vehicle.audi.a2", 4.0);
    let bytes = record(&world, 1);

    let wheels_len = 2 + 2 * (4 + 2 + 4 * WheelSample::ENCODED_LEN);
    let start = bytes.len() - HEADER_LEN - wheels_len;
    assert_eq!(bytes[start], PacketKind::VehicleWheels.tag());
    assert_eq!(
        u32::from_le_bytes([
            bytes[start + 1],
            bytes[start + 2],
            bytes[start + 3],
            bytes[start + 4]
        ]) as usize,
        wheels_len
    );
}

#[test]
fn ackermann_control_survives_replay() {
    let mut source = World::new();
    let car = spawn_at(&mut source, "vehicle.mini.cooper", 0.0);
    let ackermann = VehicleAckermannControl {
        steer: -0.1,
        steer_speed: 0.5,
        speed: 12.0,
        acceleration: 2.0,
        jerk: 0.0,
    };
    source
        .actor_mut(car)
        .unwrap()
        .vehicle_mut()
        .unwrap()
        .apply_ackermann_control(ackermann);
    let bytes = record(&source, 2);

    let mut target = World::new();
    let mut replayer = Replayer::new(PlaybackConfig::default());
    replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
    replayer.play_to_end(&mut target).unwrap();

    let live = replayer.live_actor(car.id()).unwrap();
    let vehicle = target.actor(live).unwrap().vehicle().unwrap();
    assert!(vehicle.ackermann_control_active());
    assert_eq!(vehicle.ackermann_control(), ackermann);
}

#[test]
fn mixed_world_replays_into_shifted_origin() {
    let mut source = World::with_origin(DVec3::new(1000.0, 0.0, 0.0));
    let controller = ControllerId::new("junction-7");
    source.controllers_mut().insert(controller.clone());

    let car = spawn_at(&mut source, "vehicle.nissan.patrol", 5.0);
    let walker = spawn_at(&mut source, "walker.pedestrian.0010", 6.0);
    let sign = spawn_at(&mut source, "traffic.speed_limit.60", 7.0);
    let light = spawn_at(&mut source, "traffic.traffic_light", 8.0);
    let prop = spawn_at(&mut source, "static.prop.trafficcone01", 9.0);
    source.controllers_mut().attach(&controller, light);
    {
        let vehicle = source.actor_mut(car).unwrap().vehicle_mut().unwrap();
        vehicle.set_light_state(VehicleLightState::HIGH_BEAM | VehicleLightState::FOG);
        vehicle.set_failure_state(VehicleFailureState::TirePuncture);
        vehicle.set_speed_limit(90.0);
    }
    source
        .actor_mut(walker)
        .unwrap()
        .walker_mut()
        .unwrap()
        .apply_control(WalkerControl {
            direction: Vec3::Y,
            speed: 2.5,
            jump: true,
        });
    {
        let surface = source.actor_mut(sign).unwrap().traffic_sign_mut().unwrap();
        surface.set_sign_id("sl-60-a");
        surface.set_sign_model(&SpawnClass::new("static.prop.speedlimit.60"));
    }
    {
        let surface = source.actor_mut(light).unwrap().traffic_light_mut().unwrap();
        surface.set_light_state(TrafficLightState::Yellow);
        surface.set_sign_id("tl-7-2");
        surface.set_pole_index(2);
    }
    source.actor_mut(prop).unwrap().set_velocity(Vec3::new(0.0, 0.0, -9.8));
    let bytes = record(&source, 3);

    let mut target = World::new();
    target.controllers_mut().insert(controller.clone());
    let mut replayer = Replayer::new(PlaybackConfig::default());
    replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
    let report = replayer.play_to_end(&mut target).unwrap().clone();
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.frames, 3);
    assert_eq!(report.actors_spawned, 5);

    for id in [car, walker, sign, light, prop] {
        let original = source.get(id).unwrap();
        let replayed = target.get(replayer.live_actor(id.id()).unwrap()).unwrap();
        assert_eq!(
            replayed.transform.translation,
            original.transform.translation + Vec3::new(1000.0, 0.0, 0.0)
        );
        assert_eq!(replayed.velocity, original.velocity);
        assert_eq!(replayed.info.class, original.info.class);
        assert_eq!(replayed.surface, original.surface);
    }

    let replayed_light = replayer.live_actor(light.id()).unwrap();
    assert_eq!(
        target.controllers().controller_of(replayed_light),
        Some(&controller)
    );
    assert!(matches!(
        target.get(replayer.live_actor(sign.id()).unwrap()).unwrap().surface,
        Surface::TrafficSign(_)
    ));
}

#[test]
fn removed_actors_are_destroyed_on_replay() {
    let mut source = World::new();
    let keep = spawn_at(&mut source, "static.prop.bench", 0.0);
    let gone = spawn_at(&mut source, "static.prop.bin", 1.0);

    let mut recorder = Recorder::create(Vec::new(), RecorderConfig::default(), 0).unwrap();
    recorder.record_frame(&source, 0.0).unwrap();
    source.destroy(gone);
    recorder.record_frame(&source, 0.1).unwrap();
    let bytes = recorder.finish().unwrap();

    let mut target = World::new();
    let mut replayer = Replayer::new(PlaybackConfig::default());
    replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
    let report = replayer.play_to_end(&mut target).unwrap().clone();

    assert!(report.is_clean(), "{report}");
    assert_eq!(report.actors_destroyed, 1);
    assert_eq!(target.actor_count(), 1);
    assert!(replayer.live_actor(gone.id()).is_none());
    assert!(replayer.live_actor(keep.id()).is_some());
}

#[test]
fn rejected_class_is_reported_not_fatal() {
    let mut source = World::new();
    spawn_at(&mut source, "vehicle.carlacola", 0.0);
    spawn_at(&mut source, "walker.pedestrian.0001", 1.0);
    let bytes = record(&source, 2);

    let mut target = World::new();
    target.reject_class("vehicle.carlacola");
    let mut replayer = Replayer::new(PlaybackConfig::default());
    replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
    let report = replayer.play_to_end(&mut target).unwrap();

    assert_eq!(report.frames, 2);
    assert_eq!(target.actor_count(), 1);
    // One spawn failure, then the vehicle's snapshot and wheels are
    // missing in both frames.
    assert_eq!(report.issues.len(), 5);
}
