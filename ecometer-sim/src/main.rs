use ecometer_core::{
    export_status, HandleOutcome, RequestFrame, Responder, ResponseFrame, SerialRx, REQUEST_LEN,
    RESPONSE_LEN,
};
use std::thread::sleep;
use std::time::{Duration, Instant};

mod link;
use link::{LoopbackSerial, OneShotReceiver};

fn main() {
    env_logger::init();
    println!("ecometer responder bridge (in-memory serial link)");

    let mut responder = Responder::new();
    let mut serial = LoopbackSerial::new();
    let mut receiver = OneShotReceiver::new();

    // Startup arming, exactly once; every later arm comes from the
    // handler itself.
    receiver.arm(REQUEST_LEN);

    let start = Instant::now();
    for poll in 0u16..20 {
        let tick = start.elapsed().as_millis() as u64;

        // Every seventh poll carries a bogus command byte to show the
        // silent-drop path: no reply, one lost polling cycle.
        let frame: [u8; REQUEST_LEN] = if poll % 7 == 6 {
            [0xAA, 0x02, 0x00, 0x00, 0x55]
        } else {
            RequestFrame { request_id: poll }.encode()
        };

        let Some(buf) = receiver.try_deliver(&frame) else {
            println!("poll {poll:2}: receiver disarmed, frame lost");
            continue;
        };

        match responder.on_receive_complete(&buf, tick, &mut serial, &mut receiver) {
            HandleOutcome::Responded => match serial.take_frame::<RESPONSE_LEN>() {
                Some(reply) => match ResponseFrame::parse(&reply) {
                    Ok(resp) => println!(
                        "poll {poll:2}: elec {:6.2} kWh | water {:6.2} L",
                        resp.electricity_cwh as f32 / 100.0,
                        resp.water_cl as f32 / 100.0,
                    ),
                    Err(e) => println!("poll {poll:2}: undecodable reply: {e:?}"),
                },
                None => println!("poll {poll:2}: reply frame incomplete"),
            },
            HandleOutcome::BadFrame(e) => println!("poll {poll:2}: no reply ({e:?})"),
            HandleOutcome::ResponseLost => println!("poll {poll:2}: reply timed out"),
        }

        sleep(Duration::from_millis(100));
    }

    // The alternate line-oriented export path, same transmit primitive,
    // human-readable framing.
    println!("\ntext export:");
    for _ in 0..3 {
        let tick = start.elapsed().as_millis() as u64;
        if export_status(&mut serial, tick).is_ok() {
            print!("{}", String::from_utf8_lossy(&serial.drain_all()));
        }
        sleep(Duration::from_millis(250));
    }
}
