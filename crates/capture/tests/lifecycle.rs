//! End-to-end capture lifecycle against the software backend.

use framelight_capture::{CaptureContext, CaptureDriver, CaptureProvider, ProviderKind};
use framelight_core::config::clamp_dimension;
use framelight_core::{
    CaptureConfig, CaptureError, Color, GraphicsBackend, SoftwareBackend, Strategy, Surface,
};
use proptest::prelude::*;
use std::thread;

fn active_context(width: u32, height: u32) -> CaptureContext<SoftwareBackend> {
    let mut ctx = CaptureContext::new(SoftwareBackend::new(64, 48));
    ctx.select(Strategy::Blit).unwrap();
    ctx.setup(width, height).unwrap();
    ctx
}

/// Builds an image-order RGBA buffer from `(r, g, b)` rows, top row first.
fn image(rows: &[&[(u8, u8, u8)]]) -> Vec<u8> {
    rows.iter()
        .flat_map(|row| row.iter().flat_map(|&(r, g, b)| [r, g, b, 255]))
        .collect()
}

#[test]
fn teardown_without_setup_is_harmless() {
    let mut ctx = CaptureContext::new(SoftwareBackend::new(8, 8));
    ctx.teardown().unwrap();
    ctx.select(Strategy::Blit).unwrap();
    ctx.teardown().unwrap();
    ctx.teardown().unwrap();
    assert!(!ctx.is_valid());
}

#[test]
fn teardown_twice_after_setup_is_harmless() {
    let mut ctx = active_context(4, 4);
    ctx.teardown().unwrap();
    ctx.teardown().unwrap();
    assert!(!ctx.is_valid());
    assert_eq!(ctx.backend().live_targets(), 0);
}

#[test]
fn grid_matches_every_requested_size() {
    let mut ctx = active_context(2, 2);
    for (w, h) in [(2, 2), (16, 16), (5, 3), (64, 64), (2, 9)] {
        ctx.set_dimensions(w, h).unwrap();
        let grid = ctx.color_map().unwrap();
        assert_eq!((grid.width(), grid.height()), (w as usize, h as usize));
        let ProviderKind::Blit(provider) = ctx.current() else {
            panic!("blit provider expected");
        };
        assert!(provider.buffer_capacity() >= w as usize * h as usize * 4);
    }
}

#[test]
fn literal_two_by_two_average() {
    let mut ctx = active_context(2, 2);
    let pixels = image(&[
        &[(10, 20, 30), (20, 30, 40)],
        &[(30, 40, 50), (40, 50, 60)],
    ]);
    ctx.backend_mut().set_host_image(2, 2, &pixels).unwrap();
    ctx.update().unwrap();
    assert_eq!(ctx.average(), Some(Color::new(25, 35, 45)));
}

#[test]
fn non_square_grid_orientation() {
    let mut ctx = active_context(3, 2);
    let pixels = image(&[
        &[(1, 0, 0), (2, 0, 0), (3, 0, 0)],
        &[(4, 0, 0), (5, 0, 0), (6, 0, 0)],
    ]);
    ctx.backend_mut().set_host_image(3, 2, &pixels).unwrap();
    ctx.update().unwrap();

    let grid = ctx.color_map().unwrap();
    let reds: Vec<Vec<u8>> = grid
        .columns()
        .map(|column| column.iter().map(|c| c.r).collect())
        .collect();
    // y = 0 is the bottom image row.
    assert_eq!(reds, vec![vec![4, 1], vec![5, 2], vec![6, 3]]);
}

#[test]
fn repeated_updates_are_identical() {
    let mut ctx = active_context(4, 4);
    let pixels: Vec<u8> = (0..64u32 * 48 * 4).map(|i| (i * 7 % 251) as u8).collect();
    ctx.backend_mut().set_host_image(64, 48, &pixels).unwrap();

    ctx.update().unwrap();
    let first = (ctx.color_map().cloned(), ctx.average());
    ctx.update().unwrap();
    let second = (ctx.color_map().cloned(), ctx.average());
    assert_eq!(first, second);
}

#[test]
fn clamped_dimensions_through_driver() {
    for (requested, expected) in [(0, 2), (1, 2), (2, 2), (64, 64), (100, 64), (-5, 2)] {
        let mut driver = CaptureDriver::new(SoftwareBackend::new(16, 16));
        driver
            .apply_config(CaptureConfig {
                reduction_dimension: requested,
                ..CaptureConfig::default()
            })
            .unwrap();
        let grid = driver.context().color_map().unwrap();
        assert_eq!(grid.width(), expected, "requested {requested}");
        assert_eq!(grid.height(), expected, "requested {requested}");
    }
}

#[test]
fn select_fails_without_blit_support() {
    let backend = SoftwareBackend::new(8, 8).with_capabilities(Default::default());
    let mut ctx = CaptureContext::new(backend);
    assert!(ctx.available_strategies().is_empty());

    let err = ctx.select(Strategy::Blit).unwrap_err();
    assert!(matches!(err, CaptureError::UnavailableStrategy(Strategy::Blit)));
    assert_eq!(ctx.current().strategy(), None);
}

#[test]
fn failed_select_keeps_active_provider() {
    let mut ctx = active_context(4, 4);
    ctx.backend_mut().fill_host(Color::new(11, 22, 33));
    ctx.update().unwrap();

    let mut caps = ctx.backend().capabilities();
    caps.framebuffer_enabled = false;
    ctx.backend_mut().set_capabilities(caps);
    assert!(ctx.select(Strategy::Blit).is_err());

    assert!(ctx.is_valid());
    assert_eq!(ctx.average(), Some(Color::new(11, 22, 33)));
}

#[test]
fn blit_failure_keeps_last_good_frame() {
    let mut ctx = active_context(2, 2);
    ctx.backend_mut().fill_host(Color::new(100, 110, 120));
    ctx.update().unwrap();
    let good_grid = ctx.color_map().cloned();

    ctx.backend_mut().fill_host(Color::new(0, 0, 0));
    ctx.backend_mut().fail_blits(true);
    ctx.tick();

    assert_eq!(ctx.average(), Some(Color::new(100, 110, 120)));
    assert_eq!(ctx.color_map().cloned(), good_grid);
    assert!(!ctx.blit_engine().is_valid());
    assert_eq!(ctx.backend().bound_surface(), Surface::Host);
}

#[test]
fn readback_failure_keeps_last_good_frame() {
    let mut ctx = active_context(2, 2);
    ctx.backend_mut().fill_host(Color::new(5, 15, 25));
    ctx.update().unwrap();

    ctx.backend_mut().fill_host(Color::new(250, 250, 250));
    ctx.backend_mut().fail_readbacks(true);
    ctx.tick();
    assert_eq!(ctx.average(), Some(Color::new(5, 15, 25)));

    ctx.backend_mut().fail_readbacks(false);
    ctx.update().unwrap();
    assert_eq!(ctx.average(), Some(Color::new(250, 250, 250)));
}

#[test]
fn at_most_one_reduction_target_is_ever_live() {
    let mut ctx = active_context(4, 4);
    for n in [8, 2, 64, 16, 16, 3] {
        ctx.set_dimensions(n, n).unwrap();
        assert!(ctx.backend().live_targets() <= 1);
    }
    ctx.teardown().unwrap();
    ctx.setup(5, 5).unwrap();
    ctx.teardown().unwrap();
    assert_eq!(ctx.backend().live_targets(), 0);
    assert_eq!(ctx.backend().peak_live_targets(), 1);
}

#[test]
fn multisampled_host_is_resolved_before_reduction() {
    let mut ctx = active_context(4, 4);
    ctx.backend_mut().set_host_samples(4);
    ctx.backend_mut().fill_host(Color::new(60, 70, 80));
    ctx.update().unwrap();
    assert_eq!(ctx.average(), Some(Color::new(60, 70, 80)));
    ctx.shutdown().unwrap();
    assert_eq!(ctx.backend().live_targets(), 0);
}

#[test]
fn update_restores_previous_binding() {
    let mut ctx = active_context(4, 4);
    ctx.update().unwrap();
    assert_eq!(ctx.backend().bound_surface(), Surface::Host);
}

#[test]
fn debug_mode_yields_same_average() {
    let pixels: Vec<u8> = (0..64u32 * 48 * 4).map(|i| (i % 199) as u8).collect();

    let mut plain = active_context(8, 8);
    plain.backend_mut().set_host_image(64, 48, &pixels).unwrap();
    plain.update().unwrap();

    let mut debug = active_context(8, 8);
    debug.set_debug(true);
    debug.backend_mut().set_host_image(64, 48, &pixels).unwrap();
    debug.update().unwrap();

    assert_eq!(plain.average(), debug.average());
    assert_eq!(plain.color_map(), debug.color_map());
}

#[test]
fn debug_mode_on_multisampled_host_yields_same_average() {
    let pixels: Vec<u8> = (0..64u32 * 48 * 4).map(|i| (i % 151) as u8).collect();
    let run = |debug: bool| {
        let mut ctx = active_context(8, 8);
        ctx.set_debug(debug);
        ctx.backend_mut().set_host_image(64, 48, &pixels).unwrap();
        ctx.backend_mut().set_host_samples(4);
        ctx.update().unwrap();
        assert!(ctx.blit_engine().is_valid());
        (ctx.average(), ctx.color_map().cloned())
    };
    assert_eq!(run(false), run(true));
}

#[test]
fn resizing_mid_frame_keeps_host_bound() {
    let mut ctx = active_context(4, 4);
    ctx.update().unwrap();
    ctx.set_dimensions(8, 8).unwrap();
    assert_eq!(ctx.backend().bound_surface(), Surface::Host);
    ctx.teardown().unwrap();
    assert_eq!(ctx.backend().bound_surface(), Surface::Host);
}

#[test]
fn calls_from_another_thread_are_rejected() {
    let ctx = active_context(4, 4);
    let ctx = thread::spawn(move || {
        let mut ctx = ctx;
        assert!(matches!(
            ctx.update(),
            Err(CaptureError::WrongThread { operation: "update" })
        ));
        assert!(matches!(
            ctx.set_dimensions(8, 8),
            Err(CaptureError::WrongThread { .. })
        ));
        ctx
    })
    .join()
    .unwrap();
    assert!(ctx.is_valid());
    assert_eq!(ctx.current().width(), 4);
}

proptest! {
    #[test]
    fn clamp_always_lands_in_range(n in any::<i64>()) {
        let d = clamp_dimension(n);
        prop_assert!((2..=64).contains(&d));
    }

    #[test]
    fn grid_tracks_any_dimension_sequence(sizes in proptest::collection::vec((1u32..=64, 1u32..=64), 1..8)) {
        let mut ctx = active_context(2, 2);
        for (w, h) in sizes {
            ctx.set_dimensions(w, h).unwrap();
            ctx.update().unwrap();
            let grid = ctx.color_map().unwrap();
            prop_assert_eq!((grid.width(), grid.height()), (w as usize, h as usize));
            prop_assert!(ctx.backend().live_targets() <= 1);
        }
    }
}
