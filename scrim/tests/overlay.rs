use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrim::dom::{Element, Key, Modifiers};
use scrim::{Host, ManualClock, Overlay, OverlayConfig, OverlayHooks, OverlayPhase};

fn host() -> (Host, ManualClock) {
    let clock = ManualClock::new();
    let mut host = Host::with_clock(Arc::new(clock.clone()));
    let doc = host.document_mut();
    doc.mount("body", Element::button("Open").id("opener")).unwrap();
    doc.mount("body", Element::button("Elsewhere").id("outside")).unwrap();
    doc.mount(
        "body",
        Element::box_()
            .id("panel")
            .child(Element::button("first").id("first"))
            .child(Element::input("").id("second"))
            .child(Element::link("third", "#").id("third")),
    )
    .unwrap();
    (host, clock)
}

fn advance(host: &mut Host, clock: &ManualClock, ms: u64) {
    clock.advance(Duration::from_millis(ms));
    host.poll_timers();
}

#[derive(Default, Clone)]
struct Counts {
    open: Arc<AtomicUsize>,
    after_open: Arc<AtomicUsize>,
    close: Arc<AtomicUsize>,
    after_close: Arc<AtomicUsize>,
}

impl Counts {
    fn hooks(&self) -> OverlayHooks {
        let (a, b, c, d) = (
            Arc::clone(&self.open),
            Arc::clone(&self.after_open),
            Arc::clone(&self.close),
            Arc::clone(&self.after_close),
        );
        OverlayHooks::new()
            .on_open(move || {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .on_after_open(move || {
                b.fetch_add(1, Ordering::SeqCst);
            })
            .on_close(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_after_close(move || {
                d.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn get(&self) -> [usize; 4] {
        [
            self.open.load(Ordering::SeqCst),
            self.after_open.load(Ordering::SeqCst),
            self.close.load(Ordering::SeqCst),
            self.after_close.load(Ordering::SeqCst),
        ]
    }
}

fn overlay(host: &Host, config: OverlayConfig) -> (Overlay, Counts) {
    let overlay = Overlay::new(host.env(), "panel", config);
    let counts = Counts::default();
    overlay.set_hooks(counts.hooks());
    (overlay, counts)
}

fn record_phases(overlay: &Overlay) -> Arc<Mutex<Vec<OverlayPhase>>> {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&phases);
    overlay.on_phase(move |phase, _| p.lock().unwrap().push(phase));
    phases
}

#[test]
fn test_open_is_idempotent() {
    let (mut host, clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());

    overlay.open(host.document_mut());
    overlay.open(host.document_mut());
    assert_eq!(overlay.phase(), OverlayPhase::Opening);

    advance(&mut host, &clock, 10);
    overlay.open(host.document_mut());

    assert_eq!(overlay.phase(), OverlayPhase::Open);
    assert_eq!(counts.get(), [1, 1, 0, 0]);
    assert_eq!(host.env().scroll_lock.holders(), 1);
}

#[test]
fn test_close_is_idempotent() {
    let (mut host, clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());

    overlay.close(host.document_mut());
    assert_eq!(counts.get(), [0, 0, 0, 0]);

    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    overlay.close(host.document_mut());
    overlay.close(host.document_mut());
    advance(&mut host, &clock, 300);
    overlay.close(host.document_mut());

    assert_eq!(overlay.phase(), OverlayPhase::Closed);
    assert_eq!(counts.get(), [1, 1, 1, 1]);
}

#[test]
fn test_stabilization_delay_before_open() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default().stabilization_delay_ms(0));

    overlay.open(host.document_mut());
    host.poll_timers();
    assert_eq!(overlay.phase(), OverlayPhase::Opening);

    advance(&mut host, &clock, 1);
    assert_eq!(overlay.phase(), OverlayPhase::Open);
}

#[test]
fn test_round_trip_restores_focus() {
    let (mut host, clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());
    host.document_mut().focus("opener");

    overlay.open(host.document_mut());
    assert_eq!(overlay.saved_focus().as_deref(), Some("opener"));
    advance(&mut host, &clock, 10);
    assert_eq!(host.focused(), Some("first"));

    overlay.close(host.document_mut());
    assert_eq!(overlay.phase(), OverlayPhase::Closing);
    assert_eq!(host.focused(), Some("opener"));

    advance(&mut host, &clock, 299);
    assert_eq!(overlay.phase(), OverlayPhase::Closing);
    advance(&mut host, &clock, 1);

    assert_eq!(overlay.phase(), OverlayPhase::Closed);
    assert_eq!(host.focused(), Some("opener"));
    assert_eq!(counts.get(), [1, 1, 1, 1]);
    assert_eq!(host.env().scheduler.pending(), 0);
}

#[test]
fn test_detached_saved_focus_is_not_restored() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    host.document_mut().focus("opener");

    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    host.document_mut().unmount("opener").unwrap();
    overlay.close(host.document_mut());

    assert_eq!(host.focused(), Some("first"));
}

#[test]
fn test_close_during_opening_never_visits_open() {
    let (mut host, clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());
    let phases = record_phases(&overlay);

    overlay.open(host.document_mut());
    overlay.close(host.document_mut());
    advance(&mut host, &clock, 1000);

    assert_eq!(
        *phases.lock().unwrap(),
        vec![
            OverlayPhase::Opening,
            OverlayPhase::Closing,
            OverlayPhase::Closed
        ]
    );
    assert_eq!(counts.get(), [1, 0, 1, 1]);
    assert!(!overlay.is_trapping());
}

#[test]
fn test_reopen_during_closing() {
    let (mut host, clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());

    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    overlay.close(host.document_mut());
    advance(&mut host, &clock, 100);
    overlay.open(host.document_mut());

    assert_eq!(overlay.phase(), OverlayPhase::Opening);
    assert_eq!(host.env().scroll_lock.holders(), 1);

    advance(&mut host, &clock, 500);
    assert_eq!(overlay.phase(), OverlayPhase::Open);
    assert_eq!(counts.get(), [2, 2, 1, 0]);
}

#[test]
fn test_scroll_lock_released_on_closed() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());

    overlay.open(host.document_mut());
    assert!(host.scroll_lock().is_locked());
    advance(&mut host, &clock, 10);
    overlay.close(host.document_mut());
    assert!(host.scroll_lock().is_locked());

    advance(&mut host, &clock, 300);
    assert!(!host.scroll_lock().is_locked());
}

#[test]
fn test_scroll_lock_observer_can_read_overlay() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (s, o) = (Arc::clone(&seen), overlay.clone());
    host.scroll_lock().on_change(move |locked| {
        s.lock().unwrap().push((locked, o.phase(), o.is_open()));
    });

    overlay.open(host.document_mut());
    assert!(overlay.holds_scroll_lock());
    advance(&mut host, &clock, 10);
    overlay.close(host.document_mut());
    advance(&mut host, &clock, 300);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (true, OverlayPhase::Opening, true),
            (false, OverlayPhase::Closed, false),
        ]
    );
}

#[test]
fn test_scroll_lock_observer_closing_during_open() {
    let (mut host, _clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    let o = overlay.clone();
    host.scroll_lock().on_change(move |locked| {
        if locked {
            o.dispose();
        }
    });

    overlay.open(host.document_mut());

    assert_eq!(overlay.phase(), OverlayPhase::Closed);
    assert!(!overlay.holds_scroll_lock());
    assert!(!host.scroll_lock().is_locked());
}

#[test]
fn test_scroll_lock_not_taken_without_prevent_scroll() {
    let (mut host, _clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default().prevent_scroll(false));

    overlay.open(host.document_mut());

    assert!(!overlay.holds_scroll_lock());
    assert!(!host.scroll_lock().is_locked());
}

#[test]
fn test_scroll_lock_counts_concurrent_overlays() {
    let (mut host, clock) = host();
    host.document_mut()
        .mount("body", Element::box_().id("other").child(Element::button("x")))
        .unwrap();
    let (first, _) = overlay(&host, OverlayConfig::default());
    let second = Overlay::new(host.env(), "other", OverlayConfig::default());

    first.open(host.document_mut());
    second.open(host.document_mut());
    advance(&mut host, &clock, 10);
    assert_eq!(host.scroll_lock().holders(), 2);

    first.close(host.document_mut());
    advance(&mut host, &clock, 300);
    assert_eq!(first.phase(), OverlayPhase::Closed);
    assert!(host.scroll_lock().is_locked());

    second.close(host.document_mut());
    advance(&mut host, &clock, 300);
    assert!(!host.scroll_lock().is_locked());
}

#[test]
fn test_escape_dismisses() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());

    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    host.press(Key::Escape);

    assert_eq!(overlay.phase(), OverlayPhase::Closing);
    assert!(!overlay.is_dismissable());
}

#[test]
fn test_escape_dismisses_while_opening() {
    let (mut host, _clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());

    overlay.open(host.document_mut());
    host.press(Key::Escape);

    assert_eq!(overlay.phase(), OverlayPhase::Closing);
}

#[test]
fn test_pointer_outside_dismisses_inside_does_not() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);

    host.click("second");
    assert_eq!(overlay.phase(), OverlayPhase::Open);
    assert_eq!(host.focused(), Some("second"));

    host.click("outside");
    assert_eq!(overlay.phase(), OverlayPhase::Closing);
}

#[test]
fn test_pointer_on_background_dismisses() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);

    host.pointer_down_outside();

    assert_eq!(overlay.phase(), OverlayPhase::Closing);
}

#[test]
fn test_dismiss_channels_follow_config() {
    let (mut host, clock) = host();
    let config = OverlayConfig::default()
        .close_on_escape(false)
        .close_on_overlay_click(false);
    let (overlay, _) = overlay(&host, config);
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);

    host.press(Key::Escape);
    host.click("outside");

    assert_eq!(overlay.phase(), OverlayPhase::Open);
}

#[test]
fn test_focus_trap_wraps_three_elements() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    assert!(overlay.is_trapping());

    host.press(Key::Tab);
    assert_eq!(host.focused(), Some("second"));
    host.press(Key::Tab);
    assert_eq!(host.focused(), Some("third"));
    host.press(Key::Tab);
    assert_eq!(host.focused(), Some("first"));

    host.press(Key::BackTab);
    assert_eq!(host.focused(), Some("third"));
    host.press_with(Key::Tab, Modifiers::shift());
    assert_eq!(host.focused(), Some("second"));
}

#[test]
fn test_single_focusable_wraps_to_itself() {
    let clock = ManualClock::new();
    let mut host = Host::with_clock(Arc::new(clock.clone()));
    host.document_mut()
        .mount("body", Element::button("before").id("before"))
        .unwrap();
    host.document_mut()
        .mount(
            "body",
            Element::box_()
                .id("solo")
                .child(Element::text("hello"))
                .child(Element::button("ok").id("ok")),
        )
        .unwrap();
    let overlay = Overlay::new(host.env(), "solo", OverlayConfig::default());
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);

    host.press(Key::Tab);
    assert_eq!(host.focused(), Some("ok"));
    host.press(Key::BackTab);
    assert_eq!(host.focused(), Some("ok"));
}

#[test]
fn test_tab_leaves_container_when_not_trapping() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default().trap_focus(false));
    host.document_mut().focus("third");
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);

    host.press(Key::Tab);

    assert_eq!(host.focused(), Some("opener"));
}

#[test]
fn test_dispose_releases_everything() {
    let (mut host, _clock) = host();
    let (overlay, counts) = overlay(&host, OverlayConfig::default());
    overlay.open(host.document_mut());

    overlay.dispose();

    assert_eq!(overlay.phase(), OverlayPhase::Closed);
    assert!(host.env().dispatcher.is_empty());
    assert_eq!(host.env().scheduler.pending(), 0);
    assert!(!host.scroll_lock().is_locked());
    assert_eq!(counts.get(), [1, 0, 0, 0]);
}

#[test]
fn test_dropping_overlay_releases_everything() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());
    overlay.open(host.document_mut());
    advance(&mut host, &clock, 10);
    assert_eq!(host.env().dispatcher.len(), 3);

    drop(overlay);

    assert!(host.env().dispatcher.is_empty());
    assert!(!host.scroll_lock().is_locked());
    assert_eq!(host.env().scheduler.pending(), 0);
}

#[test]
fn test_repeated_cycles_do_not_leak_listeners() {
    let (mut host, clock) = host();
    let (overlay, _) = overlay(&host, OverlayConfig::default());

    for _ in 0..4 {
        overlay.open(host.document_mut());
        advance(&mut host, &clock, 10);
        assert_eq!(host.env().dispatcher.len(), 3);
        overlay.close(host.document_mut());
        assert!(host.env().dispatcher.is_empty());
        advance(&mut host, &clock, 300);
    }
    assert_eq!(host.env().scheduler.pending(), 0);
}
