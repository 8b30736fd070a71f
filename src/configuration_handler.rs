use crate::{
    configuration::Configuration, error::ConfigError, policy::OperatorDirectory,
    slots::BusinessHours,
};
use chrono::Weekday;
use chrono_tz::Tz;
use clap::Parser;
use std::{ffi::OsString, path::PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Conflict-free appointment slot booking")]
struct Arguments {
    /// Port of the HTTP server
    #[arg(long, env = "BOOKING_PORT", default_value_t = 3000)]
    port: u16,

    /// Address the HTTP server binds to
    #[arg(long, env = "BOOKING_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// PostgreSQL connection URL. Without it reservations are kept in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Operator credentials as name:password, comma separated
    #[arg(long = "operator", env = "BOOKING_OPERATORS", value_delimiter = ',')]
    operators: Vec<String>,

    #[arg(long, env = "BOOKING_OPENING_HOUR", default_value_t = 9)]
    opening_hour: u32,

    #[arg(long, env = "BOOKING_CLOSING_HOUR", default_value_t = 20)]
    closing_hour: u32,

    #[arg(long, env = "BOOKING_SLOT_MINUTES", default_value_t = 30)]
    slot_minutes: u32,

    /// IANA timezone of the business, e.g. Europe/Belgrade
    #[arg(long, env = "BOOKING_TIMEZONE", default_value = "Europe/Belgrade", value_parser = parse_timezone)]
    timezone: Tz,

    /// Weekly day on which no slots are bookable
    #[arg(long, env = "BOOKING_CLOSED_WEEKDAY", default_value = "Sun", value_parser = parse_weekday)]
    closed_weekday: Weekday,

    /// Service recorded when a reservation names none
    #[arg(long, env = "BOOKING_SERVICE_LABEL", default_value = "Haircut")]
    service_label: String,

    /// Additional .env file to load before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidTimezone(value.to_string()))
}

fn parse_weekday(value: &str) -> Result<Weekday, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidWeekday(value.to_string()))
}

#[derive(Debug, Clone)]
pub struct ConfigurationHandler {
    port: u16,
    bind_address: String,
    database_url: Option<String>,
    operators: OperatorDirectory,
    business_hours: BusinessHours,
    timezone: Tz,
    closed_weekday: Weekday,
    service_label: String,
}

impl ConfigurationHandler {
    /// Reads flags and environment; exits with usage on malformed flags.
    pub fn parse_arguments() -> Result<Self, ConfigError> {
        Self::load(|| Ok(Arguments::parse()))
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        Self::load(|| {
            Arguments::try_parse_from(&args).map_err(|err| ConfigError::Arguments(err.to_string()))
        })
    }

    fn load(parse: impl Fn() -> Result<Arguments, ConfigError>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut arguments = parse()?;
        if let Some(path) = &arguments.env_file {
            dotenvy::from_path(path).map_err(|err| ConfigError::EnvFile(err.to_string()))?;
            arguments = parse()?;
        }
        Self::from_arguments(arguments)
    }

    fn from_arguments(arguments: Arguments) -> Result<Self, ConfigError> {
        Ok(Self {
            port: arguments.port,
            bind_address: arguments.bind,
            database_url: arguments.database_url.filter(|url| !url.trim().is_empty()),
            operators: OperatorDirectory::from_entries(&arguments.operators)?,
            business_hours: BusinessHours::new(
                arguments.opening_hour,
                arguments.closing_hour,
                arguments.slot_minutes,
            )?,
            timezone: arguments.timezone,
            closed_weekday: arguments.closed_weekday,
            service_label: arguments.service_label,
        })
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn bind_address(&self) -> String {
        self.bind_address.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn operators(&self) -> OperatorDirectory {
        self.operators.clone()
    }

    fn business_hours(&self) -> BusinessHours {
        self.business_hours
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }

    fn closed_weekday(&self) -> Weekday {
        self.closed_weekday
    }

    fn service_label(&self) -> String {
        self.service_label.clone()
    }
}
