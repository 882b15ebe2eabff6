//! A looping fade-out/fade-in mask: two opacity animations chained in one sequence that
//! restarts every 20 seconds.

use orrery::animations::{Animation, Sequence, Sequencer};
use orrery::clock::TickRate;
use orrery::scene::Node;

fn main() {
    let rate = TickRate::default();

    let mask = Node::rect(800.0, 600.0).with_fill_style("black");

    let sequence = Sequence::default().set_label("breathing mask");
    sequence
        .add_animation(Animation::opacity(&mask, 0.0, 10001.0, 1.0, 0.0).unwrap())
        .unwrap();
    sequence
        .add_animation(Animation::opacity(&mask, 10000.0, 10000.0, 0.0, 1.0).unwrap())
        .unwrap();
    sequence.loop_at(20000.0);

    let sequencer = Sequencer::default();
    sequencer.add(&sequence);
    sequencer.start();

    // Simulate 25 seconds: the sequence loops back past the 20s mark.
    for _ in 0..(60 * 25) {
        sequencer.update(rate.interval());
    }

    println!("mask alpha after 25s: {:.2}", mask.get_alpha());
    println!("{}", sequencer);
}
