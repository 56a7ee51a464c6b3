//! Filter command implementation.
//!
//! Parses filter expressions and shows what they compile to, without
//! touching any data.

use taskview_core::filter::{compile, Dialect, FilterParser, SqlFragment};

use super::{CommandContext, Result};
use crate::cli::DialectArg;
use crate::output::{
    format_filter_nodes_json, format_filter_nodes_table, format_sql_json, format_sql_table,
};

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::Mysql,
        }
    }
}

/// Options for the filter sql command.
#[derive(Debug)]
pub struct FilterSqlOptions {
    /// Filter expression.
    pub expression: String,
    /// Target dialect.
    pub dialect: DialectArg,
    /// Also match unset fields.
    pub include_nulls: bool,
}

/// Executes the filter parse command.
///
/// # Errors
///
/// Returns an error if the expression does not parse.
pub fn execute_parse(ctx: &CommandContext, expression: &str) -> Result<()> {
    let nodes = FilterParser::parse(expression, &ctx.timezone)?;

    if ctx.json_output {
        println!("{}", format_filter_nodes_json(&nodes)?);
    } else if !ctx.quiet {
        print!("{}", format_filter_nodes_table(&nodes, ctx.use_colors));
    }

    Ok(())
}

/// Compiles an expression to SQL for a dialect.
fn render_sql(opts: &FilterSqlOptions, timezone: &str) -> Result<SqlFragment> {
    let nodes = FilterParser::parse(&opts.expression, timezone)?;
    let fragment = match compile(&nodes, opts.include_nulls)? {
        Some(condition) => condition.to_sql(opts.dialect.into()),
        None => SqlFragment {
            sql: String::new(),
            params: Vec::new(),
        },
    };
    Ok(fragment)
}

/// Executes the filter sql command.
///
/// # Errors
///
/// Returns an error if the expression does not parse or compile.
pub fn execute_sql(ctx: &CommandContext, opts: &FilterSqlOptions) -> Result<()> {
    let opts = FilterSqlOptions {
        expression: opts.expression.clone(),
        dialect: opts.dialect,
        include_nulls: opts.include_nulls || ctx.include_nulls,
    };
    let fragment = render_sql(&opts, &ctx.timezone)?;

    if ctx.json_output {
        println!("{}", format_sql_json(&fragment)?);
    } else if !ctx.quiet {
        print!("{}", format_sql_table(&fragment, ctx.use_colors));
    }

    Ok(())
}
