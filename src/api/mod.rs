use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum, error::ErrorKind};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    Frequency, InvestmentType, ProjectionParameters, ProjectionResult, Scenario, ScenarioOutcome,
    TaxRule, best_by_wealth, project_scenarios, run_projection,
};
use crate::error::ParameterError;

const MAX_YEARS: u32 = 100;
const MAX_COMPARE_SCENARIOS: usize = 32;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliInvestmentType {
    Fixed,
    #[value(alias = "percent-of-salary")]
    Percentage,
}

impl From<CliInvestmentType> for InvestmentType {
    fn from(value: CliInvestmentType) -> Self {
        match value {
            CliInvestmentType::Fixed => InvestmentType::Fixed,
            CliInvestmentType::Percentage => InvestmentType::PercentOfSalary,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxRule {
    Pir,
    Fif,
    #[value(alias = "nz")]
    None,
}

impl From<CliTaxRule> for TaxRule {
    fn from(value: CliTaxRule) -> Self {
        match value {
            CliTaxRule::Pir => TaxRule::Pir,
            CliTaxRule::Fif => TaxRule::Fif,
            CliTaxRule::None => TaxRule::None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiInvestmentType {
    Fixed,
    #[serde(
        alias = "percent-of-salary",
        alias = "percentOfSalary",
        alias = "percent_of_salary"
    )]
    Percentage,
}

impl From<ApiInvestmentType> for CliInvestmentType {
    fn from(value: ApiInvestmentType) -> Self {
        match value {
            ApiInvestmentType::Fixed => CliInvestmentType::Fixed,
            ApiInvestmentType::Percentage => CliInvestmentType::Percentage,
        }
    }
}

impl From<InvestmentType> for ApiInvestmentType {
    fn from(value: InvestmentType) -> Self {
        match value {
            InvestmentType::Fixed => ApiInvestmentType::Fixed,
            InvestmentType::PercentOfSalary => ApiInvestmentType::Percentage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiTaxRule {
    #[serde(alias = "PIR")]
    Pir,
    #[serde(alias = "FIF")]
    Fif,
    #[serde(alias = "nz", alias = "NZ")]
    None,
}

impl From<ApiTaxRule> for CliTaxRule {
    fn from(value: ApiTaxRule) -> Self {
        match value {
            ApiTaxRule::Pir => CliTaxRule::Pir,
            ApiTaxRule::Fif => CliTaxRule::Fif,
            ApiTaxRule::None => CliTaxRule::None,
        }
    }
}

impl From<TaxRule> for ApiTaxRule {
    fn from(value: TaxRule) -> Self {
        match value {
            TaxRule::Pir => ApiTaxRule::Pir,
            TaxRule::Fif => ApiTaxRule::Fif,
            TaxRule::None => ApiTaxRule::None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    starting_income: Option<f64>,
    salary_growth_rate: Option<f64>,
    initial_investment: Option<f64>,
    investment_type: Option<ApiInvestmentType>,
    fixed_amount: Option<f64>,
    salary_percentage: Option<f64>,
    years: Option<u32>,
    frequency: Option<u32>,
    expected_return: Option<f64>,
    entry_fee: Option<f64>,
    management_fee: Option<f64>,
    tax_rule: Option<ApiTaxRule>,
}

#[derive(Debug, Deserialize)]
struct ScenarioPayload {
    name: String,
    #[serde(flatten)]
    parameters: ProjectPayload,
}

#[derive(Debug, Deserialize)]
struct ComparePayload {
    scenarios: Vec<ScenarioPayload>,
}

#[derive(Parser, Debug)]
#[command(
    name = "wealthcast",
    about = "Projects a recurring investment plan with fees and NZ-style investment tax"
)]
struct Cli {
    #[arg(long, default_value_t = 120000.0, help = "Annual income in year zero")]
    starting_income: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual salary growth in percent"
    )]
    salary_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 42000.0,
        help = "Lump sum invested before the first period"
    )]
    initial_investment: f64,
    #[arg(long, value_enum, default_value_t = CliInvestmentType::Fixed)]
    investment_type: CliInvestmentType,
    #[arg(
        long,
        default_value_t = 1000.0,
        help = "Contribution per period, used with --investment-type=fixed"
    )]
    fixed_amount: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Share of salary invested in percent, used with --investment-type=percentage"
    )]
    salary_percentage: f64,
    #[arg(long, default_value_t = 21)]
    years: u32,
    #[arg(
        long,
        default_value_t = 1,
        help = "Periods per year: 1, 4, 12 or 26"
    )]
    frequency: u32,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Expected annual return in percent, e.g. 8"
    )]
    expected_return: f64,
    #[arg(
        long,
        default_value_t = 0.5,
        help = "Fee in percent on every contribution and on final withdrawal"
    )]
    entry_fee: f64,
    #[arg(
        long,
        default_value_t = 0.2,
        help = "Annual management fee in percent of the balance"
    )]
    management_fee: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliTaxRule::None,
        help = "Tax regime: PIR bands, FIF bands or untaxed"
    )]
    tax_rule: CliTaxRule,
    #[arg(long, help = "Print the result as JSON instead of a table")]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    investment_type: ApiInvestmentType,
    tax_rule: ApiTaxRule,
    frequency: u32,
    years: u32,
    #[serde(flatten)]
    result: ProjectionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    scenarios: Vec<ScenarioOutcome>,
    best_scenario: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn require_finite(flag: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { flag })
    }
}

fn build_parameters(cli: Cli) -> Result<ProjectionParameters, ParameterError> {
    let starting_income = require_finite("--starting-income", cli.starting_income)?;
    let salary_growth_rate = require_finite("--salary-growth-rate", cli.salary_growth_rate)?;
    let initial_investment = require_finite("--initial-investment", cli.initial_investment)?;
    let fixed_amount = require_finite("--fixed-amount", cli.fixed_amount)?;
    let salary_percentage = require_finite("--salary-percentage", cli.salary_percentage)?;
    let expected_return = require_finite("--expected-return", cli.expected_return)?;
    let entry_fee = require_finite("--entry-fee", cli.entry_fee)?;
    let management_fee = require_finite("--management-fee", cli.management_fee)?;

    if starting_income < 0.0 {
        return Err(ParameterError::OutOfRange {
            flag: "--starting-income",
            requirement: ">= 0",
        });
    }

    if salary_growth_rate <= -100.0 {
        return Err(ParameterError::OutOfRange {
            flag: "--salary-growth-rate",
            requirement: "> -100",
        });
    }

    if initial_investment < 0.0 {
        return Err(ParameterError::OutOfRange {
            flag: "--initial-investment",
            requirement: ">= 0",
        });
    }

    if fixed_amount < 0.0 {
        return Err(ParameterError::OutOfRange {
            flag: "--fixed-amount",
            requirement: ">= 0",
        });
    }

    if cli.years > MAX_YEARS {
        return Err(ParameterError::OutOfRange {
            flag: "--years",
            requirement: "at most 100",
        });
    }

    if expected_return <= -100.0 {
        return Err(ParameterError::OutOfRange {
            flag: "--expected-return",
            requirement: "> -100",
        });
    }

    // Fees capped at 100% keep every deduction within the balance it is charged on.
    for (flag, fee) in [
        ("--entry-fee", entry_fee),
        ("--management-fee", management_fee),
    ] {
        if !(0.0..=100.0).contains(&fee) {
            return Err(ParameterError::OutOfRange {
                flag,
                requirement: "between 0 and 100",
            });
        }
    }

    Ok(ProjectionParameters {
        starting_income,
        salary_growth_rate,
        initial_investment,
        investment_type: cli.investment_type.into(),
        fixed_amount,
        salary_percentage,
        years: cli.years,
        frequency: Frequency::try_from(cli.frequency)?,
        expected_return,
        entry_fee,
        management_fee,
        tax_rule: cli.tax_rule.into(),
    })
}

/// Parses `project` arguments (the first item is the program name), runs the
/// projection and renders it as a table or JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, ParameterError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(e.to_string());
        }
        Err(e) => return Err(ParameterError::Arguments(e.to_string())),
    };
    let json = cli.json;
    let params = build_parameters(cli)?;
    let result = run_projection(&params);

    if json {
        let response = build_project_response(&params, result);
        let body = serde_json::to_string_pretty(&response)
            .map_err(|e| ParameterError::Render(e.to_string()))?;
        Ok(format!("{body}\n"))
    } else {
        Ok(render_report(&params, &result))
    }
}

fn render_report(params: &ProjectionParameters, result: &ProjectionResult) -> String {
    let mut lines = vec![
        format!(
            "Projection over {} years, {} periods per year, tax rule {:?}",
            params.years,
            params.frequency.periods_per_year(),
            params.tax_rule
        ),
        format!("{:>5} {:>14} {:>14}", "Year", "Invested", "Portfolio"),
        "-".repeat(35),
    ];
    for point in &result.chart_data {
        lines.push(format!(
            "{:>5} {:>14} {:>14}",
            point.year, point.invested, point.portfolio_value
        ));
    }
    lines.push("-".repeat(35));
    lines.push(format!("Total invested:   {:>14}", result.total_invested));
    lines.push(format!("Entry fees:       {:>14}", result.total_entry_fees));
    lines.push(format!("Management fees:  {:>14}", result.total_mgmt_fees));
    lines.push(format!("Tax:              {:>14}", result.tax));
    lines.push(format!("Total wealth:     {:>14}", result.total_wealth));
    lines.push(format!("Net return:       {:>13.2}%", result.net_return));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/compare", post(compare_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection API listening");
    info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(payload: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload),
        Err(rejection) => rejected_payload(rejection.body_text()),
    }
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload),
        Err(rejection) => rejected_payload(rejection.body_text()),
    }
}

fn rejected_payload(detail: String) -> Response {
    info!(error = %detail, "rejected malformed request");
    error_response(StatusCode::BAD_REQUEST, &detail)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let params = match parameters_from_payload(payload) {
        Ok(params) => params,
        Err(e) => {
            info!(error = %e, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let result = run_projection(&params);
    json_response(StatusCode::OK, build_project_response(&params, result))
}

async fn compare_handler(payload: Result<Json<ComparePayload>, JsonRejection>) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejected_payload(rejection.body_text()),
    };
    match compare_from_payload(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            info!(error = %e, "rejected comparison request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn with_cache_control(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)).into_response())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn parameters_from_json(json: &str) -> Result<ProjectionParameters, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    parameters_from_payload(payload).map_err(|e| e.to_string())
}

fn parameters_from_payload(
    payload: ProjectPayload,
) -> Result<ProjectionParameters, ParameterError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.starting_income {
        cli.starting_income = v;
    }
    if let Some(v) = payload.salary_growth_rate {
        cli.salary_growth_rate = v;
    }
    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.investment_type {
        cli.investment_type = v.into();
    }
    if let Some(v) = payload.fixed_amount {
        cli.fixed_amount = v;
    }
    if let Some(v) = payload.salary_percentage {
        cli.salary_percentage = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v;
    }
    if let Some(v) = payload.expected_return {
        cli.expected_return = v;
    }
    if let Some(v) = payload.entry_fee {
        cli.entry_fee = v;
    }
    if let Some(v) = payload.management_fee {
        cli.management_fee = v;
    }
    if let Some(v) = payload.tax_rule {
        cli.tax_rule = v.into();
    }

    build_parameters(cli)
}

fn compare_from_payload(payload: ComparePayload) -> Result<CompareResponse, ParameterError> {
    let count = payload.scenarios.len();
    if count == 0 || count > MAX_COMPARE_SCENARIOS {
        return Err(ParameterError::ScenarioCount {
            max: MAX_COMPARE_SCENARIOS,
            actual: count,
        });
    }

    let scenarios = payload
        .scenarios
        .into_iter()
        .map(|scenario| {
            let name = scenario.name.trim();
            if name.is_empty() {
                return Err(ParameterError::EmptyScenarioName);
            }
            Ok(Scenario {
                name: name.to_string(),
                parameters: parameters_from_payload(scenario.parameters)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = project_scenarios(&scenarios);
    let best_scenario = best_by_wealth(&outcomes).map(|outcome| outcome.name.clone());
    Ok(CompareResponse {
        scenarios: outcomes,
        best_scenario,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        starting_income: 120_000.0,
        salary_growth_rate: 3.0,
        initial_investment: 42_000.0,
        investment_type: CliInvestmentType::Fixed,
        fixed_amount: 1_000.0,
        salary_percentage: 10.0,
        years: 21,
        frequency: 1,
        expected_return: 8.0,
        entry_fee: 0.5,
        management_fee: 0.2,
        tax_rule: CliTaxRule::None,
        json: false,
    }
}

fn build_project_response(
    params: &ProjectionParameters,
    result: ProjectionResult,
) -> ProjectResponse {
    ProjectResponse {
        investment_type: params.investment_type.into(),
        tax_rule: params.tax_rule.into(),
        frequency: params.frequency.periods_per_year(),
        years: params.years,
        result,
    }
}
