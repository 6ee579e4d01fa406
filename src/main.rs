//! PwmSiggen - Main entry point
//!
//! On ESP-IDF this brings up the board (LEDC PWM, esp_timer, GPIO buttons,
//! UART log) and runs the main loop forever. On any other target it runs a
//! scripted session over simulated hardware and prints the diagnostic log.

mod board;

fn main() {
    board::run();
}
