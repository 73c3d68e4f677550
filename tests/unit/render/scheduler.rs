use super::*;

#[test]
fn latest_tick_wins() {
    let mb = Mailbox::new();
    mb.post(ChatMsg::Tick(1.0));
    mb.post(ChatMsg::Tick(2.0));
    mb.post(ChatMsg::Tick(3.0));
    assert_eq!(mb.try_recv(), Some(ChatMsg::Tick(3.0)));
    assert_eq!(mb.try_recv(), None);
}

#[test]
fn seek_is_delivered_before_a_later_tick() {
    let mb = Mailbox::new();
    mb.post(ChatMsg::Seek(10.0));
    mb.post(ChatMsg::Tick(10.5));
    assert_eq!(mb.recv(), Some(ChatMsg::Seek(10.0)));
    assert_eq!(mb.recv(), Some(ChatMsg::Tick(10.5)));
}

#[test]
fn seek_discards_pending_tick_and_seek() {
    let mb = Mailbox::new();
    mb.post(ChatMsg::Tick(1.0));
    mb.post(ChatMsg::Seek(5.0));
    mb.post(ChatMsg::Seek(7.0));
    assert_eq!(mb.try_recv(), Some(ChatMsg::Seek(7.0)));
    assert_eq!(mb.try_recv(), None);
}

#[test]
fn close_wakes_a_blocked_receiver() {
    let mb = Arc::new(Mailbox::new());
    let rx = Arc::clone(&mb);
    let waiter = std::thread::spawn(move || rx.recv());
    std::thread::sleep(Duration::from_millis(20));
    mb.close();
    assert_eq!(waiter.join().unwrap(), None);

    mb.post(ChatMsg::Tick(1.0));
    assert_eq!(mb.try_recv(), None);
}

#[test]
fn blocked_receiver_gets_posted_message() {
    let mb = Arc::new(Mailbox::new());
    let rx = Arc::clone(&mb);
    let waiter = std::thread::spawn(move || rx.recv());
    std::thread::sleep(Duration::from_millis(10));
    mb.post(ChatMsg::Tick(4.0));
    assert_eq!(waiter.join().unwrap(), Some(ChatMsg::Tick(4.0)));
}

#[test]
fn in_memory_surface_shares_state_across_clones() {
    let surface = InMemorySurface::new();
    let mut writer = surface.clone();
    assert!(surface.latest().is_none());
    assert!(!surface.wait_for(1, Duration::from_millis(5)));

    writer
        .present(&RgbaImage::from_pixel(2, 2, image::Rgba([3, 3, 3, 255])))
        .unwrap();
    assert!(surface.wait_for(1, Duration::from_millis(5)));
    assert_eq!(surface.presented(), 1);
    assert_eq!(surface.latest().unwrap().get_pixel(1, 1)[0], 3);
}
