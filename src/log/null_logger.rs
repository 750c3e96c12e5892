/*!

Used when the `logging` feature is off: no output anywhere, but the `log` facade's
level filter still follows the configuration so disabled macros stay cheap.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global logger to conform to this `LogConfiguration`.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
