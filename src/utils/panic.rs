/// Colorized backtraces for panics. Only enabled *when* debugging.
pub fn setup() {
    #[cfg(debug_assertions)]
    {
        color_backtrace::install();
    }
}
