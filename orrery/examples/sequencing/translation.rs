//! Drives a sequencer by hand at a fixed 60Hz and prints the node trajectory: a bubble
//! rising across the viewport while zooming in.

use orrery::animations::{Animation, Sequence, Sequencer};
use orrery::clock::TickRate;
use orrery::scene::Node;

fn main() {
    let rate = TickRate::default();

    let bubble = Node::image("bubble_0", "bubble.png");
    // Pretend the host decoded a 64x64 asset.
    bubble.on_load(64.0, 64.0);

    let sequence = Sequence::default().set_label("rising bubble");
    sequence
        .add_animation(
            Animation::translation(&bubble, 0.0, 1000.0, (400.0, 600.0), (250.0, -100.0))
                .unwrap()
                .set_loop(false),
        )
        .unwrap();
    sequence
        .add_animation(
            Animation::zoom(&bubble, 0.0, 1000.0, 0.2, 1.2)
                .unwrap()
                .set_loop(false),
        )
        .unwrap();

    let sequencer = Sequencer::default();
    sequencer.add(&sequence);
    sequencer.start();

    for tick in 0..=62 {
        sequencer.update(rate.interval());
        if tick % 10 == 0 {
            let (x, y) = bubble.get_position();
            let (width, height) = bubble.get_size();
            println!(
                "t={:>6.1}ms position=({:>5.1}, {:>6.1}) size={:.0}x{:.0}",
                sequencer.get_time(),
                x,
                y,
                width,
                height
            );
        }
    }

    println!("sequence finished: {}", sequence.is_finished());
}
