use num_bigint::BigUint;
use shiftmix::{
    cipher_round_matrix, exponent, local_exponent, register_round_matrix, Combiner,
    FeedbackRegister, RegisterShape, SpeckFeedback,
};

fn main() -> shiftmix::Result<()> {
    let shape = RegisterShape::new(32, 4, vec![0, 3])?;
    let feedback = SpeckFeedback::new(32, 1)?;
    let init = BigUint::from(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210u128);

    let mut reg = FeedbackRegister::new(shape.clone(), Combiner::Xor, &feedback, init.clone())?;
    println!("Register: r = {}, n = {}, taps = {:?}", shape.r(), shape.n(), shape.taps());
    println!("Initial state: {}", hex::encode(init.to_bytes_be()));
    for (round, step) in reg.steps().take(8).enumerate() {
        println!(
            "Round {:>2}: output {:08x}  state {}",
            round + 1,
            step.output,
            hex::encode(step.state.to_bytes_be())
        );
    }

    let m = register_round_matrix(&shape, &cipher_round_matrix(32)?)?;
    let top = (shape.n() - 1) * shape.r()..shape.bits();
    println!("Diffusion exponent: {:?}", exponent(&m, 40)?);
    println!("Local exponent (newest cell): {:?}", local_exponent(&m, 40, top)?);
    Ok(())
}
