//! Floppy card driven through the port map, with real image files.

mod common;

use std::fs;
use std::path::PathBuf;

use common::{Op, make_rig, temp_path, test_config};
use emu_core::{Bus, Observable, Value};
use emu_nabu::{DiskError, Geometry, NabuError};

const SS_SIZE: usize = 204_800;
const DS_SIZE: usize = 409_600;

/// Removes the file when dropped.
struct TempImage(PathBuf);

impl TempImage {
    /// Image where every byte of linear sector N holds `N ^ salt`.
    fn new(name: &str, size: usize, salt: u8) -> Self {
        let data: Vec<u8> = (0..size).map(|i| ((i / 1024) as u8) ^ salt).collect();
        let path = temp_path(name);
        fs::write(&path, data).expect("write image");
        Self(path)
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn read_sector_via_ports<B: Bus>(bus: &mut B, track: u8, sector: u8) -> Vec<u8> {
    bus.io_write(0xC1, track);
    bus.io_write(0xC2, sector);
    bus.io_write(0xC0, 0x80);
    (0..1024).map(|_| bus.io_read(0xC3)).collect()
}

#[test]
fn firmware_reads_sector_through_port_script() {
    let image = TempImage::new("script.img", SS_SIZE, 0);
    let mut rig = make_rig(test_config());
    rig.nabu.insert_disk(0, &image.0).expect("insert");

    let script = rig.nabu.cpu_mut();
    script.script.extend([Op::Out(0xC1, 1), Op::Out(0xC2, 1), Op::Out(0xC0, 0x80)]);
    script.script.extend(std::iter::repeat_n(Op::In(0xC3), 1024));
    script.script.push_back(Op::In(0xC0));
    while !rig.nabu.cpu().script.is_empty() {
        rig.nabu.run_slice(&mut ());
    }

    let results = &rig.nabu.cpu().results;
    assert_eq!(results.len(), 1025);
    assert!(results[..1024].iter().all(|&b| b == 5), "track 1 sector 1 is linear sector 5");
    assert_eq!(results[1024] & 0x01, 0, "BUSY clear after the last byte");
    assert_eq!(rig.nabu.query("fdc.mode"), Some(Value::from("idle")));
}

#[test]
fn first_sector_starts_at_offset_zero() {
    let image = TempImage::new("offset0.img", SS_SIZE, 0x5A);
    let mut rig = make_rig(test_config());
    rig.nabu.insert_disk(0, &image.0).expect("insert");
    let data = read_sector_via_ports(rig.nabu.bus_mut(), 0, 1);
    assert!(data.iter().all(|&b| b == 0x5A));
}

#[test]
fn double_sided_image_uses_linear_layout() {
    let image = TempImage::new("ds.img", DS_SIZE, 0);
    let mut rig = make_rig(test_config());
    rig.nabu.insert_disk(1, &image.0).expect("insert");
    assert_eq!(rig.nabu.bus().fdc.geometry(1), Some(Geometry::DoubleSided400K));

    let bus = rig.nabu.bus_mut();
    bus.io_write(0xCF, 0x05); // drive 1, side 1
    let data = read_sector_via_ports(bus, 1, 2);
    // track 1 * 5 + (2 - 1), side select ignored
    assert!(data.iter().all(|&b| b == 6));

    let data = read_sector_via_ports(bus, 60, 1);
    assert!(data.iter().all(|&b| b == (300 % 256) as u8));
}

#[test]
fn empty_drive_reports_not_ready() {
    let mut rig = make_rig(test_config());
    let bus = rig.nabu.bus_mut();
    bus.io_write(0xC2, 1);
    bus.io_write(0xC0, 0x80);
    assert_eq!(bus.io_read(0xC0) & 0x81, 0x80);
}

#[test]
fn wrong_size_image_is_refused() {
    let image = TempImage::new("short.img", 1000, 0);
    let mut rig = make_rig(test_config());
    let err = rig.nabu.insert_disk(0, &image.0).unwrap_err();
    assert!(matches!(err, NabuError::Disk(DiskError::InvalidSize(1000))));
    assert!(!rig.nabu.bus().fdc.has_disk(0));
}

#[test]
fn missing_file_is_refused() {
    let mut rig = make_rig(test_config());
    let err = rig
        .nabu
        .insert_disk(0, temp_path("does-not-exist.img"))
        .unwrap_err();
    assert!(matches!(err, NabuError::Disk(DiskError::Io(_))));
    assert!(!rig.nabu.bus().fdc.has_disk(0));
}

#[test]
fn occupied_and_empty_drive_guards() {
    let first = TempImage::new("guard-a.img", SS_SIZE, 1);
    let second = TempImage::new("guard-b.img", SS_SIZE, 2);
    let mut rig = make_rig(test_config());

    assert!(matches!(
        rig.nabu.eject_disk(0),
        Err(NabuError::Disk(DiskError::DriveEmpty(0)))
    ));
    rig.nabu.insert_disk(0, &first.0).expect("insert");
    assert!(matches!(
        rig.nabu.insert_disk(0, &second.0),
        Err(NabuError::Disk(DiskError::DriveOccupied(0)))
    ));
    assert!(matches!(
        rig.nabu.insert_disk(2, &second.0),
        Err(NabuError::Disk(DiskError::InvalidDrive(2)))
    ));

    let data = read_sector_via_ports(rig.nabu.bus_mut(), 0, 1);
    assert!(data.iter().all(|&b| b == 1), "first image still inserted");
}

#[test]
fn eject_and_reinsert_reproduces_reads() {
    let image = TempImage::new("roundtrip.img", SS_SIZE, 0x33);
    let mut rig = make_rig(test_config());

    rig.nabu.insert_disk(0, &image.0).expect("insert");
    let before = read_sector_via_ports(rig.nabu.bus_mut(), 7, 4);
    rig.nabu.eject_disk(0).expect("eject");
    assert!(!rig.nabu.bus().fdc.has_disk(0));

    rig.nabu.insert_disk(0, &image.0).expect("reinsert");
    let after = read_sector_via_ports(rig.nabu.bus_mut(), 7, 4);
    assert_eq!(before, after);
    assert_eq!(before[0], (7 * 5 + 3) ^ 0x33);
}

#[test]
fn eject_mid_transfer_returns_to_idle() {
    let image = TempImage::new("abort.img", SS_SIZE, 0);
    let mut rig = make_rig(test_config());
    rig.nabu.insert_disk(0, &image.0).expect("insert");

    let bus = rig.nabu.bus_mut();
    bus.io_write(0xC2, 1);
    bus.io_write(0xC0, 0x80);
    bus.io_read(0xC3);
    assert_eq!(bus.io_read(0xC0) & 0x03, 0x03);

    rig.nabu.eject_disk(0).expect("eject");
    assert_eq!(rig.nabu.query("fdc.mode"), Some(Value::from("idle")));
    assert_eq!(rig.nabu.bus_mut().io_read(0xC0) & 0x01, 0);
}
