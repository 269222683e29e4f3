use clap::Args;
use std::time::Duration;

use crate::error::AppError;
use crate::workflows::application::{
    ApplicationFormController, CommissionAnswer, Country, DealSize, ExperienceType,
    ExperienceYears, FormField, FormOptions, SimulatedSink, SubmitError, SubmitOutcome,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated delivery delay in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub(crate) delay_ms: u64,
    /// Answer "no" to the commission-only question to show the eligibility gate.
    #[arg(long)]
    pub(crate) decline_commission: bool,
}

pub(crate) fn sample_fields() -> Vec<FormField> {
    vec![
        FormField::FirstName("Jane".to_string()),
        FormField::LastName("Doe".to_string()),
        FormField::Country(Country::Canada),
        FormField::PhoneNumber("+1-555-0100".to_string()),
        FormField::InstagramUrl("instagram.com/jane".to_string()),
        FormField::ExperienceYears(ExperienceYears::TwoToFour),
        FormField::AvgDealSize(DealSize::OneToThreeThousand),
        FormField::WhyConsider("10 closed deals last quarter".to_string()),
    ]
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        delay_ms,
        decline_commission,
    } = args;

    println!("Closer application demo");
    let mut controller = ApplicationFormController::new();
    let sink = SimulatedSink::new(Duration::from_millis(delay_ms));

    println!("\nSubmitting the empty draft");
    report_attempt(controller.submit(&sink).await, &controller);

    for field in sample_fields() {
        println!("- set {}", field.name());
        controller.set_field(field);
    }

    println!("\nSubmitting without an experience type");
    controller.set_commission_only(CommissionAnswer::Yes);
    report_attempt(controller.submit(&sink).await, &controller);

    controller.toggle_experience_type(ExperienceType::DmClosing);
    println!("- toggled {}", ExperienceType::DmClosing);

    if decline_commission {
        controller.set_commission_only(CommissionAnswer::No);
        println!("- answered \"no\" to the commission-only question");
    }

    println!("\nSubmitting the completed draft");
    report_attempt(controller.submit(&sink).await, &controller);

    let payload = serde_json::to_string_pretty(controller.application())
        .unwrap_or_else(|err| format!("<unserializable draft: {err}>"));
    println!("\nFinal draft ({}):\n{payload}", controller.state().label());

    Ok(())
}

fn report_attempt(
    result: Result<SubmitOutcome, SubmitError>,
    controller: &ApplicationFormController,
) {
    match result {
        Ok(SubmitOutcome::Submitted(receipt)) => {
            println!("Application received at {}", receipt.submitted_at);
        }
        Ok(SubmitOutcome::Blocked) => {
            let notice = controller.notice().unwrap_or("submission is disabled");
            println!(
                "Submit disabled (can_submit = {}): {notice}",
                controller.can_submit()
            );
        }
        Ok(SubmitOutcome::Ignored) => println!("Submit ignored: application already sent"),
        Err(SubmitError::Validation(err)) => {
            println!("Validation failed ({err}): {}", err.user_message());
        }
        Err(SubmitError::Send(err)) => println!("Delivery failed: {err}"),
    }
}

pub(crate) fn run_options() {
    let options = FormOptions::standard();
    let sections = [
        ("Countries", &options.countries),
        ("Years of closing experience", &options.experience_years),
        ("Types of experience", &options.experience_types),
        ("Average deal size", &options.deal_sizes),
    ];

    for (index, (title, values)) in sections.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("{title}");
        for value in values.iter() {
            println!("- {value}");
        }
    }
}
