use looplab_core::{EventConfig, EventLoop, ManualClock, TaskKind};

fn session() -> (EventLoop<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let session = EventLoop::new(clock.clone());
    (session, clock)
}

fn executed_names(session: &EventLoop<ManualClock>) -> Vec<String> {
    session
        .logs()
        .iter()
        .filter_map(|entry| entry.message.strip_prefix("Executing: "))
        .map(str::to_string)
        .collect()
}

#[test]
fn call_stack_beats_microtask_beats_callback() {
    let (mut session, clock) = session();
    session.set_automatic(false);

    session.load_event(EventConfig::new(TaskKind::Timer, "t").with_delay(0));
    session.load_event(EventConfig::new(TaskKind::Promise, "p"));
    session.load_event(EventConfig::new(TaskKind::Sync, "s"));

    // One sweep promotes the zero-delay timer, so all four queues hold
    // runnable work at once.
    session.tick();
    session.start();
    for _ in 0..4 {
        clock.advance(600);
        session.tick();
        session.next_step();
    }
    clock.advance(600);
    session.tick();

    let order = executed_names(&session);
    assert_eq!(
        order,
        vec![
            "t (register)",
            "p (create)",
            "s",
            "p (then)",
            "t (ready)",
        ],
        "call stack drains first, then microtasks, then callbacks"
    );
}

#[test]
fn microtask_timestamps_do_not_outrank_call_stack() {
    // The promise continuation carries a later timestamp than every call
    // stack task; queue priority must still decide first.
    let (mut session, clock) = session();
    session.set_automatic(false);

    session.load_event(EventConfig::new(TaskKind::Promise, "p"));
    clock.advance(500);
    session.load_event(EventConfig::new(TaskKind::Sync, "late"));

    session.start();
    clock.advance(600);
    session.tick();
    session.next_step();
    clock.advance(600);
    session.tick();
    session.next_step();

    let order = executed_names(&session);
    assert_eq!(order, vec!["p (create)", "late", "p (then)"]);
}

#[test]
fn callbacks_run_in_registration_order_even_when_delays_race() {
    let (mut session, clock) = session();
    session.set_automatic(false);

    // A is registered before B, but B's delay elapses first. Both are due
    // by the time the promoting sweep runs, and that single sweep walks the
    // buffer in registration order.
    session.load_event(EventConfig::new(TaskKind::Timer, "A").with_delay(300));
    session.load_event(EventConfig::new(TaskKind::Timer, "B").with_delay(50));

    session.start();
    clock.advance(1_000);
    session.tick();

    for _ in 0..3 {
        session.next_step();
        clock.advance(600);
        session.tick();
    }

    let order = executed_names(&session);
    let a = order
        .iter()
        .position(|name| name == "A (ready)")
        .expect("A's callback ran");
    let b = order
        .iter()
        .position(|name| name == "B (ready)")
        .expect("B's callback ran");
    assert!(a < b, "A registered first, so A runs first: {order:?}");
}
