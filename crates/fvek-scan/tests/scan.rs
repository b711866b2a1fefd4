use std::io::Write;

use aes_core::{expand_key, AesKey, KeySize};
use fvek_scan::{
    find_candidates, scan_allocation, AllocationSource, OsVersion, PoolLayout, PoolTag, RawImage,
    ScanConfig, Scanner,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

const SEED_A: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];
const SEED_B: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];

fn plant(buffer: &mut [u8], offset: usize, key: AesKey) {
    let schedule = expand_key(&key);
    let bytes = schedule.as_bytes();
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
}

#[test]
fn single_aes128_key_in_zero_pool() {
    let mut buffer = vec![0u8; 512];
    plant(&mut buffer, 40, AesKey::from(SEED_A));

    let reports = Scanner::new().scan(&buffer, 0x8a3c5000);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].primary, AesKey::from(SEED_A));
    assert_eq!(reports[0].secondary, None);
    assert_eq!(reports[0].cipher(), KeySize::Aes128);
}

#[test]
fn fvek_and_tweak_in_offset_order() {
    let mut buffer = vec![0u8; 512];
    plant(&mut buffer, 40, AesKey::from(SEED_A));
    plant(&mut buffer, 300, AesKey::from(SEED_B));

    let detection = scan_allocation(&buffer, &ScanConfig::default()).unwrap();
    let offsets: Vec<usize> = detection.matches().iter().map(|m| m.offset).collect();
    assert_eq!(offsets, vec![40, 300]);

    let reports = Scanner::new().scan(&buffer, 0x1000);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].primary, AesKey::from(SEED_A));
    assert_eq!(reports[0].secondary, Some(AesKey::from(SEED_B)));
    assert_eq!(reports[0].key_material().len(), 32);
}

#[test]
fn order_follows_offset_not_key_bytes() {
    let mut buffer = vec![0u8; 512];
    plant(&mut buffer, 40, AesKey::from(SEED_B));
    plant(&mut buffer, 300, AesKey::from(SEED_A));

    let reports = Scanner::new().scan(&buffer, 0x1000);
    assert_eq!(reports[0].primary, AesKey::from(SEED_B));
    assert_eq!(reports[0].secondary, Some(AesKey::from(SEED_A)));
}

#[test]
fn three_keys_are_noise() {
    let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
    let mut buffer = vec![0u8; 768];
    for offset in [8, 200, 400] {
        let mut seed = [0u8; 16];
        rng.fill_bytes(&mut seed);
        plant(&mut buffer, offset, AesKey::from(seed));
    }

    assert_eq!(find_candidates(&buffer, 8).len(), 3);
    assert!(scan_allocation(&buffer, &ScanConfig::default()).is_none());
    assert!(Scanner::new().scan(&buffer, 0x1000).is_empty());
}

#[test]
fn uniform_buffers_have_no_candidates() {
    for fill in [0x00u8, 0xff] {
        let buffer = vec![fill; 4096];
        assert!(find_candidates(&buffer, 8).is_empty());
    }
}

#[test]
fn random_noise_has_no_candidates() {
    let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
    let mut buffer = vec![0u8; 8192];
    rng.fill_bytes(&mut buffer);
    assert!(find_candidates(&buffer, 8).is_empty());
}

#[test]
fn aes256_pair_is_reported_as_aes256() {
    let mut rng = ChaCha20Rng::from_seed([5u8; 32]);
    let mut fvek = [0u8; 32];
    let mut tweak = [0u8; 32];
    rng.fill_bytes(&mut fvek);
    rng.fill_bytes(&mut tweak);

    let mut buffer = vec![0u8; 640];
    plant(&mut buffer, 16, AesKey::from(fvek));
    plant(&mut buffer, 320, AesKey::from(tweak));

    let detection = scan_allocation(&buffer, &ScanConfig::default()).unwrap();
    assert!(detection.matches().iter().all(|m| m.size() == KeySize::Aes256));

    let reports = Scanner::new().scan(&buffer, 0x2000);
    assert_eq!(reports[0].cipher(), KeySize::Aes256);
    assert_eq!(reports[0].primary, AesKey::from(fvek));
    assert_eq!(reports[0].secondary, Some(AesKey::from(tweak)));
}

#[test]
fn recovers_key_from_tagged_pool_in_raw_image() {
    let version: OsVersion = "10.0".parse().unwrap();
    let tag = version.ensure_supported().unwrap().pool_tag();
    assert_eq!(tag, PoolTag::CNGB);

    let mut rng = ChaCha20Rng::from_seed([21u8; 32]);
    let mut image = vec![0u8; 0x4000];
    rng.fill_bytes(&mut image);
    // Clear every header slot so random bytes never look like our tag.
    for slot in image.chunks_mut(16) {
        slot[4..8].fill(0);
    }

    let pool = 0x1200;
    let blocks = 0x20u8;
    image[pool..pool + 16].fill(0);
    image[pool + 2] = blocks;
    image[pool + 4..pool + 8].copy_from_slice(tag.as_bytes());
    image[pool + 16..pool + blocks as usize * 16].fill(0);
    let mut fvek = [0u8; 32];
    rng.fill_bytes(&mut fvek);
    plant(&mut image, pool + 48, AesKey::from(fvek));

    // Same key outside any tagged allocation must not be reported.
    plant(&mut image, 0x3000, AesKey::from(fvek));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&image).unwrap();
    file.flush().unwrap();
    let raw = RawImage::open(file.path(), PoolLayout::X64)
        .unwrap()
        .with_chunk_len(0x400);
    assert_eq!(raw.allocations(tag, 184).unwrap().len(), 1);

    let reports = Scanner::new().scan_source(&raw, tag).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].address, pool as u64);
    assert_eq!(reports[0].primary, AesKey::from(fvek));
    assert_eq!(reports[0].secondary, None);
}
