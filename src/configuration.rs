use chrono::Weekday;
use chrono_tz::Tz;

use crate::{policy::OperatorDirectory, slots::BusinessHours};

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn bind_address(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn operators(&self) -> OperatorDirectory;
    fn business_hours(&self) -> BusinessHours;
    fn timezone(&self) -> Tz;
    fn closed_weekday(&self) -> Weekday;
    fn service_label(&self) -> String;
}
