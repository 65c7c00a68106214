//! Command-line commands
//!
//! Parsing is pure (`Command::parse`); `Command::run` performs the request
//! against an already configured client and returns the JSON to print.

use std::str::FromStr;

use esi_auth::TokenRecord;
use esi_client::{EsiClient, OrderQuery, OrderType, StructureFilter};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{Error, Result};

pub const USAGE: &str = "\
usage: esi [--config PATH] <command> [args]

commands:
  token                                  print a usable access token (cached, refreshed or new)
  login                                  force browser authorization
  types [page]                           list type ids
  type <type_id>                         show a type
  regions                                list region ids
  region <region_id>                     show a region
  structures [market|manufacturing_basic]
                                         list public structure ids
  structure <structure_id>               show a structure (authorized)
  market-types <region_id> [page]        type ids traded in a region
  orders <region_id> [buy|sell|all] [type_id]
                                         every page of a region's orders
  history <region_id> <type_id>          daily market history
  structure-orders <structure_id> [page] orders in a structure market (authorized)";

const COMMANDS: &[&str] = &[
    "token",
    "login",
    "types",
    "type",
    "regions",
    "region",
    "structures",
    "structure",
    "market-types",
    "orders",
    "history",
    "structure-orders",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Token,
    Login,
    Types { page: Option<u32> },
    Type { type_id: i32 },
    Regions,
    Region { region_id: i32 },
    Structures { filter: Option<StructureFilter> },
    Structure { structure_id: i64 },
    MarketTypes { region_id: i32, page: Option<u32> },
    Orders { region_id: i32, query: OrderQuery },
    History { region_id: i32, type_id: i32 },
    StructureOrders { structure_id: i64, page: Option<u32> },
}

/// Positional arguments of one command.
struct Args<'a> {
    command: &'static str,
    rest: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn required<T: FromStr>(&mut self, argument: &'static str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let value = self.rest.next().ok_or(Error::MissingArgument {
            command: self.command,
            argument,
        })?;
        self.parse(argument, value)
    }

    fn optional<T: FromStr>(&mut self, argument: &'static str) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        self.rest
            .next()
            .map(|value| self.parse(argument, value))
            .transpose()
    }

    fn parse<T: FromStr>(&self, argument: &'static str, value: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e: T::Err| Error::InvalidArgument {
            command: self.command,
            argument,
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    fn finish<T>(mut self, command: T) -> Result<T> {
        match self.rest.next() {
            Some(_) => Err(Error::TooManyArguments(self.command)),
            None => Ok(command),
        }
    }
}

impl Command {
    /// Parse the words after the global flags.
    pub fn parse(words: &[String]) -> Result<Self> {
        let (name, rest) = words.split_first().ok_or(Error::MissingCommand(USAGE))?;
        let command = COMMANDS
            .iter()
            .copied()
            .find(|command| *command == name)
            .ok_or_else(|| Error::UnknownCommand(name.clone(), USAGE))?;
        let mut args = Args {
            command,
            rest: rest.iter(),
        };

        let parsed = match command {
            "token" => Command::Token,
            "login" => Command::Login,
            "types" => Command::Types {
                page: args.optional("page")?,
            },
            "type" => Command::Type {
                type_id: args.required("type_id")?,
            },
            "regions" => Command::Regions,
            "region" => Command::Region {
                region_id: args.required("region_id")?,
            },
            "structures" => Command::Structures {
                filter: args.optional("filter")?,
            },
            "structure" => Command::Structure {
                structure_id: args.required("structure_id")?,
            },
            "market-types" => Command::MarketTypes {
                region_id: args.required("region_id")?,
                page: args.optional("page")?,
            },
            "orders" => Command::Orders {
                region_id: args.required("region_id")?,
                query: OrderQuery {
                    order_type: args.optional::<OrderType>("order_type")?.unwrap_or_default(),
                    type_id: args.optional("type_id")?,
                    page: None,
                },
            },
            "history" => Command::History {
                region_id: args.required("region_id")?,
                type_id: args.required("type_id")?,
            },
            "structure-orders" => Command::StructureOrders {
                structure_id: args.required("structure_id")?,
                page: args.optional("page")?,
            },
            other => return Err(Error::UnknownCommand(other.to_string(), USAGE)),
        };
        args.finish(parsed)
    }

    /// Whether the command needs an access token.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Command::Token
                | Command::Login
                | Command::Structure { .. }
                | Command::StructureOrders { .. }
        )
    }

    /// Run a resource command. `Token` and `Login` are handled by the caller.
    pub async fn run(&self, client: &EsiClient) -> esi_client::Result<Value> {
        match self {
            Command::Token | Command::Login => Ok(Value::Null),
            Command::Types { page } => to_json(client.types(*page).await?),
            Command::Type { type_id } => to_json(client.type_info(*type_id).await?),
            Command::Regions => to_json(client.regions().await?),
            Command::Region { region_id } => to_json(client.region(*region_id).await?),
            Command::Structures { filter } => to_json(client.structures(*filter).await?),
            Command::Structure { structure_id } => {
                to_json(client.structure(*structure_id).await?)
            }
            Command::MarketTypes { region_id, page } => {
                to_json(client.market_types(*region_id, *page).await?)
            }
            Command::Orders { region_id, query } => {
                to_json(client.market_orders_all(*region_id, *query).await?)
            }
            Command::History { region_id, type_id } => {
                to_json(client.market_history(*region_id, *type_id).await?)
            }
            Command::StructureOrders { structure_id, page } => {
                to_json(client.structure_orders(*structure_id, *page).await?)
            }
        }
    }
}

/// What `token` and `login` print. The access token itself is never shown.
pub fn token_summary(record: &TokenRecord) -> Value {
    let claims = record.claims();
    json!({
        "character_id": claims.as_ref().and_then(|c| c.character_id()),
        "character_name": claims.as_ref().and_then(|c| c.name.clone()),
        "expires_at": claims.as_ref().and_then(|c| c.exp),
        "scopes": claims.map(|c| c.scp).unwrap_or_default(),
        "token_type": record.token_type,
        "has_refresh_token": record.refresh_token().is_some(),
    })
}

fn to_json<T: Serialize>(value: T) -> esi_client::Result<Value> {
    serde_json::to_value(value).map_err(|e| esi_client::Error::Decode(e.to_string()))
}
