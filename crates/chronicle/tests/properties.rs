use chronicle::packet::{self, HEADER_LEN};
use chronicle::{
    LogReader, LogWriter, Packet, PacketEvent, PacketKind, SessionInfo, VehicleWheels,
    WheelLocation, WheelSample,
};
use proptest::prelude::*;

fn arb_wheel() -> impl Strategy<Value = WheelSample> {
    (
        prop::sample::select(vec![
            WheelLocation::FrontLeft,
            WheelLocation::FrontRight,
            WheelLocation::BackLeft,
            WheelLocation::BackRight,
            WheelLocation::Front,
            WheelLocation::Back,
        ]),
        -1.0e3f32..1.0e3,
        -1.0e3f32..1.0e3,
    )
        .prop_map(|(location, steering_angle, tire_rotation)| {
            WheelSample::new(location, steering_angle, tire_rotation)
        })
}

fn arb_vehicle_wheels() -> impl Strategy<Value = VehicleWheels> {
    (any::<u32>(), prop::collection::vec(arb_wheel(), 0..6))
        .prop_map(|(database_id, wheels)| VehicleWheels { database_id, wheels })
}

#[derive(Debug, Clone)]
enum Written {
    Removed(Vec<u32>),
    Unknown(u8, Vec<u8>),
}

fn arb_written() -> impl Strategy<Value = Written> {
    prop_oneof![
        prop::collection::vec(any::<u32>(), 0..20).prop_map(Written::Removed),
        (10u8..=255, prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(tag, payload)| Written::Unknown(tag, payload)),
    ]
}

fn split_packet(bytes: &[u8]) -> (u8, u32, &[u8]) {
    let length = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    (bytes[0], length, &bytes[HEADER_LEN..])
}

proptest! {
    #[test]
    fn wheels_roundtrip(vehicles in prop::collection::vec(arb_vehicle_wheels(), 0..8)) {
        let mut bytes = Vec::new();
        packet::write_packet_buffered(
            &mut bytes,
            &mut Vec::new(),
            PacketKind::VehicleWheels,
            &vehicles,
        )
        .unwrap();

        let (tag, _, payload) = split_packet(&bytes);
        let kind = PacketKind::from_tag(tag).unwrap();
        prop_assert_eq!(
            Packet::decode(kind, payload).unwrap(),
            Packet::VehicleWheels(vehicles)
        );
    }

    #[test]
    fn declared_length_matches_payload(ids in prop::collection::vec(any::<u32>(), 0..300)) {
        let mut bytes = Vec::new();
        packet::write_packet_buffered(&mut bytes, &mut Vec::new(), PacketKind::ActorRemoved, &ids)
            .unwrap();

        let (_, length, payload) = split_packet(&bytes);
        prop_assert_eq!(length as usize, payload.len());
        prop_assert_eq!(payload.len(), 2 + 4 * ids.len());
    }

    #[test]
    fn unknown_tags_keep_alignment(written in prop::collection::vec(arb_written(), 0..24)) {
        let mut writer = LogWriter::create(Vec::new(), &SessionInfo::default()).unwrap();
        writer.begin_frame(0.0).unwrap();
        for packet in &written {
            match packet {
                Written::Removed(ids) => writer.write_packet(PacketKind::ActorRemoved, ids).unwrap(),
                Written::Unknown(tag, payload) => writer.write_raw(*tag, payload).unwrap(),
            }
        }
        writer.end_frame().unwrap();
        let bytes = writer.into_inner();

        let mut reader = LogReader::open(bytes.as_slice()).unwrap();
        prop_assert!(matches!(reader.next_packet().unwrap(), Some(PacketEvent::Frame(_))));
        for packet in &written {
            let expected = match packet {
                Written::Removed(ids) => PacketEvent::Packet(Packet::ActorRemoved(ids.clone())),
                Written::Unknown(tag, payload) => PacketEvent::Skipped {
                    tag: *tag,
                    length: payload.len() as u32,
                },
            };
            prop_assert_eq!(reader.next_packet().unwrap(), Some(expected));
        }
        prop_assert_eq!(reader.next_packet().unwrap(), None);
        prop_assert_eq!(reader.position() as usize, bytes.len());
    }
}
