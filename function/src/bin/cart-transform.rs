//! Entry point for the platform sandbox. Build with
//! `cargo build -p cart-transform-function --release --target wasm32-wasip1`.

fn main() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    cart_transform::execute(&mut stdin.lock(), &mut stdout.lock());
}
