//! Smoke tests against a real panel.
//!
//! These tests require an AKP153 to be connected.
//! Run with: cargo test -p ajazz-deck --test hardware -- --ignored --nocapture

use std::sync::Arc;
use std::time::Duration;

use ajazz_deck::{DeckDevice, DeckOptions, HidTransport, HidWiredTransport};
use image::{DynamicImage, Rgb, RgbImage};

const VID: u16 = 0x0300;
const PID: u16 = 0x1001;

fn open_panel() -> DeckDevice {
    let api = hidapi::HidApi::new().expect("hidapi init");
    let transport = HidWiredTransport::open(&api, VID, PID)
        .expect("No panel found - plug in an AKP153");
    let transport: Arc<dyn HidTransport> = Arc::new(transport);
    DeckDevice::open(transport, DeckOptions::default()).expect("open session")
}

#[test]
#[ignore] // requires hardware
fn firmware_version_is_readable() {
    let device = open_panel();
    let version = device.firmware_version().unwrap();
    println!("Firmware: {version}");
    assert!(!version.is_empty());
}

#[test]
#[ignore] // requires hardware
fn paints_every_key_then_clears() {
    let device = open_panel();
    let pixels = device.pixels();
    for index in 0..device.keys() {
        let shade = index * (255 / device.keys());
        let img = RgbImage::from_pixel(pixels, pixels, Rgb([shade, 0, 255 - shade]));
        device.set_image(index, &DynamicImage::ImageRgb8(img)).unwrap();
    }
    device.flush().unwrap();
    std::thread::sleep(Duration::from_secs(2));
    device.clear().unwrap();
    device.flush().unwrap();
}

#[test]
#[ignore] // requires hardware
fn sleep_and_wake_with_fade() {
    let device = open_panel();
    device.set_sleep_fade_duration(Duration::from_millis(500));
    device.set_brightness(80).unwrap();
    device.sleep().unwrap();
    assert!(device.asleep());
    device.wake().unwrap();
    assert_eq!(device.brightness(), 80);
}
