//! Console tables for the descriptive output and model summaries

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};

use crate::pipeline::describe::{ColumnSummary, CorrelationMatrix, CrossTab};
use crate::pipeline::regression::{
    BreuschPagan, CoefficientTable, ConfusionMatrix, EndogeneityTest, Inference, MarginalEffects,
    OlsResults, ProbitResults,
};

const TOTAL: &str = "Total";

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn number(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

fn decimal(value: f64, places: usize) -> Cell {
    if value.is_finite() {
        number(format!("{:.*}", places, value))
    } else {
        number("NaN").fg(Color::DarkGrey)
    }
}

fn p_value(value: f64) -> Cell {
    let cell = decimal(value, 4);
    if value < 0.05 {
        cell.fg(Color::Green)
    } else {
        cell
    }
}

/// Print a table indented under the current step
pub fn display(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

pub fn value_counts_table(column: &str, counts: &[(String, u64)]) -> Table {
    let mut table = new_table(vec![column.to_string(), "count".to_string()]);
    for (value, count) in counts {
        table.add_row(vec![Cell::new(value), number(count)]);
    }
    table
}

/// Cross-tabulation with a `Total` row and column.
pub fn crosstab_table(tab: &CrossTab) -> Table {
    let mut header = vec![format!("{} \\ {}", tab.row_name, tab.col_name)];
    header.extend(tab.col_labels.iter().cloned());
    header.push(TOTAL.to_string());
    let mut table = new_table(header);

    for ((label, row), total) in tab.row_labels.iter().zip(&tab.counts).zip(tab.row_totals()) {
        let mut cells = vec![Cell::new(label)];
        cells.extend(row.iter().map(number));
        cells.push(number(total).add_attribute(Attribute::Bold));
        table.add_row(cells);
    }

    let mut totals = vec![Cell::new(TOTAL).add_attribute(Attribute::Bold)];
    totals.extend(tab.col_totals().iter().map(number));
    totals.push(number(tab.grand_total()).add_attribute(Attribute::Bold));
    table.add_row(totals);
    table
}

/// One row per statistic, one column per variable, like a summary frame.
pub fn summary_table(summaries: &[ColumnSummary]) -> Table {
    let mut header = vec![String::new()];
    header.extend(summaries.iter().map(|s| s.name.clone()));
    let mut table = new_table(header);

    let rows: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (label, stat) in rows {
        let mut cells = vec![Cell::new(label).add_attribute(Attribute::Bold)];
        cells.extend(summaries.iter().map(|s| decimal(stat(s), 4)));
        table.add_row(cells);
    }
    table
}

pub fn shares_table(shares: &[(String, f64)]) -> Table {
    let mut table = new_table(vec!["indicator".to_string(), "% equal to 1".to_string()]);
    for (name, share) in shares {
        table.add_row(vec![Cell::new(name), decimal(*share, 2)]);
    }
    table
}

pub fn correlation_table(corr: &CorrelationMatrix) -> Table {
    let mut header = vec![String::new()];
    header.extend(corr.names.iter().cloned());
    let mut table = new_table(header);

    for (i, name) in corr.names.iter().enumerate() {
        let mut cells = vec![Cell::new(name).add_attribute(Attribute::Bold)];
        for j in 0..corr.names.len() {
            let value = corr.values[(i, j)];
            let cell = decimal(value, 3);
            cells.push(if i != j && value.abs() >= 0.5 {
                cell.fg(Color::Yellow)
            } else {
                cell
            });
        }
        table.add_row(cells);
    }
    table
}

/// Estimate, standard error, test statistic, p-value and 95% interval.
pub fn coefficient_table(coefficients: &CoefficientTable) -> Table {
    let statistic = match coefficients.inference {
        Inference::Normal => "z",
        Inference::StudentT { .. } => "t",
    };
    let mut table = new_table(
        ["", "coef", "std err", statistic, "P>|stat|", "[0.025", "0.975]"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for i in 0..coefficients.len() {
        table.add_row(vec![
            Cell::new(&coefficients.names[i]).add_attribute(Attribute::Bold),
            decimal(coefficients.estimates[i], 4),
            decimal(coefficients.std_errors[i], 4),
            decimal(coefficients.statistics[i], 3),
            p_value(coefficients.p_values[i]),
            decimal(coefficients.conf_low[i], 3),
            decimal(coefficients.conf_high[i], 3),
        ]);
    }
    table
}

fn fit_statistics(rows: Vec<(&str, String)>) -> Table {
    let mut table = new_table(vec!["Statistic".to_string(), "Value".to_string()]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), number(value)]);
    }
    table
}

pub fn probit_summary_table(res: &ProbitResults) -> Table {
    fit_statistics(vec![
        ("Dep. variable", res.outcome.clone()),
        ("Covariance", res.cov_type.label().to_string()),
        ("Observations", res.nobs.to_string()),
        ("Df model", res.df_model.to_string()),
        ("Df residuals", res.df_resid.to_string()),
        ("Iterations", res.iterations.to_string()),
        ("Pseudo R-squ.", format!("{:.4}", res.pseudo_r_squared)),
        ("Log-likelihood", format!("{:.3}", res.log_likelihood)),
        ("LL-null", format!("{:.3}", res.ll_null)),
        ("LLR p-value", format!("{:.4e}", res.llr_pvalue)),
        ("AIC", format!("{:.3}", res.aic)),
        ("BIC", format!("{:.3}", res.bic)),
    ])
}

pub fn ols_summary_table(res: &OlsResults) -> Table {
    fit_statistics(vec![
        ("Dep. variable", res.outcome.clone()),
        ("Covariance", res.cov_type.label().to_string()),
        ("Observations", res.nobs.to_string()),
        ("Df model", res.df_model.to_string()),
        ("Df residuals", res.df_resid.to_string()),
        ("R-squared", format!("{:.4}", res.r_squared)),
        ("Adj. R-squared", format!("{:.4}", res.adj_r_squared)),
        ("F-statistic", format!("{:.3}", res.f_statistic)),
        ("Log-likelihood", format!("{:.3}", res.log_likelihood)),
        ("AIC", format!("{:.3}", res.aic)),
        ("BIC", format!("{:.3}", res.bic)),
    ])
}

/// Rows actual 0/1, columns predicted 0/1.
pub fn confusion_table(cm: &ConfusionMatrix) -> Table {
    let mut table = new_table(
        ["actual \\ predicted", "0", "1", TOTAL]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for (label, row) in ["0", "1"].iter().zip(cm.rows()) {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            number(row[0]),
            number(row[1]),
            number(row[0] + row[1]),
        ]);
    }
    table
}

pub fn marginal_effects_table(ape: &MarginalEffects) -> Table {
    coefficient_table(&ape.effects)
}

pub fn breusch_pagan_table(bp: &BreuschPagan) -> Table {
    fit_statistics(vec![
        ("LM statistic", format!("{:.4}", bp.lm)),
        ("LM p-value", format!("{:.4e}", bp.lm_pvalue)),
        ("F statistic", format!("{:.4}", bp.f_statistic)),
        ("F p-value", format!("{:.4e}", bp.f_pvalue)),
        ("Degrees of freedom", bp.df.to_string()),
    ])
}

pub fn endogeneity_table(test: &EndogeneityTest) -> Table {
    fit_statistics(vec![
        ("Test statistic", format!("{:.6}", test.statistic)),
        ("Degrees of freedom", test.df.to_string()),
        ("P-value", format!("{:.6}", test.p_value)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crosstab_has_margins() {
        let tab = CrossTab {
            row_name: "year".into(),
            col_name: "treatment".into(),
            row_labels: vec!["2013".into(), "2014".into()],
            col_labels: vec!["0".into(), "1".into()],
            counts: vec![vec![3, 1], vec![0, 2]],
        };
        let rendered = crosstab_table(&tab).to_string();
        assert!(rendered.contains(TOTAL));
        assert!(rendered.contains("2014"));
        // Grand total
        assert!(rendered.contains('6'));
    }

    #[test]
    fn test_confusion_row_totals() {
        let cm = ConfusionMatrix {
            true_negative: 4,
            false_positive: 1,
            false_negative: 2,
            true_positive: 7,
        };
        let rendered = confusion_table(&cm).to_string();
        assert!(rendered.contains('5'));
        assert!(rendered.contains('9'));
    }
}
