use anyhow::Result;
use seihrd::compartments::Compartment;
use seihrd::runner::run_with_args;

fn main() -> Result<()> {
    let outcome = run_with_args()?;
    let trajectory = &outcome.trajectory;

    let peak_infectious = trajectory.peak(Compartment::Infected);
    let peak_admissions = trajectory
        .new_hospitalizations()
        .into_iter()
        .fold(0.0_f64, f64::max);
    let final_deaths = trajectory
        .last()
        .map_or(0.0, |point| point.state.deceased);

    if let Some(point) = peak_infectious {
        println!(
            "peak infectious {:.0} at t={}; peak new hospitalizations {:.1}/day; deaths {:.0}",
            point.state.infected, point.time, peak_admissions, final_deaths
        );
    }
    if let Some(fit) = outcome.fit() {
        println!(
            "compared {} days: rmse {:.2}, mae {:.2}, observed peak day {}, modeled peak day {}",
            fit.days,
            fit.root_mean_squared_error,
            fit.mean_absolute_error,
            fit.observed_peak_day,
            fit.modeled_peak_day
        );
    }
    for path in &outcome.reports {
        println!("wrote {}", path.display());
    }
    Ok(())
}
