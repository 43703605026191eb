// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ABAP Unit commands
//!
//! Commands: run

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use quick_xml::escape::{escape, partial_escape};

use sapcli_core::application::aunit;
use sapcli_core::domain::activation::WorkbenchObject;
use sapcli_core::domain::aunit::{Alert, RunResults, TestStatus};
use sapcli_core::domain::objects::{Class, Package, Program};
use sapcli_core::Connection;

/// Kind of object whose tests are run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestedType {
    Program,
    Class,
    Package,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Results document as returned by the server
    Raw,
    #[default]
    Human,
    Junit4,
}

#[derive(Subcommand, Debug)]
pub enum AUnitCommand {
    /// Run the unit tests of an object
    Run {
        #[arg(value_enum)]
        object_type: TestedType,

        name: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        output: OutputFormat,
    },
}

fn tested_object(object_type: TestedType, name: &str) -> Box<dyn WorkbenchObject> {
    match object_type {
        TestedType::Program => Box::new(Program::new(name)),
        TestedType::Class => Box::new(Class::new(name)),
        TestedType::Package => Box::new(Package::new(name)),
    }
}

/// Runs the command and returns the number of failed test methods
pub async fn handle_command(command: AUnitCommand, connection: &dyn Connection) -> Result<usize> {
    match command {
        AUnitCommand::Run {
            object_type,
            name,
            output,
        } => {
            let object = tested_object(object_type, &name);
            let run = aunit::run(connection, object.as_ref()).await?;

            match output {
                OutputFormat::Raw => println!("{}", run.xml),
                OutputFormat::Human => print!("{}", format_human(&run.results)),
                OutputFormat::Junit4 => print!("{}", format_junit4(&name, &run.results)),
            }

            Ok(run.results.critical_count())
        }
    }
}

fn alert_line(prefix: &str, alert: &Alert) -> String {
    format!("{}[{}] [{}] - {}", prefix, alert.severity, alert.kind, alert.title)
}

/// Test tree with verdicts, then the failures, then the totals
pub fn format_human(results: &RunResults) -> String {
    let mut lines: Vec<String> = results.alerts.iter().map(|a| alert_line("* ", a)).collect();

    for program in &results.programs {
        lines.push(program.name.clone());
        for class in &program.test_classes {
            lines.push(format!("  {}", class.name));
            for method in &class.test_methods {
                lines.push(format!("    {} [{}]", method.name, method.status()));
            }
        }
    }

    if !results.programs.is_empty() {
        lines.push(String::new());
    }

    let mut successful = 0;
    let mut tolerable = 0;
    let mut critical = 0;

    for (program, class, method) in results.test_methods() {
        match method.status() {
            TestStatus::Ok => successful += 1,
            TestStatus::Skip => tolerable += 1,
            TestStatus::Err => {
                critical += 1;
                lines.push(format!("{}=>{}=>{}", program.name, class.name, method.name));
                lines.extend(method.alerts.iter().map(|a| alert_line("*  ", a)));
            }
        }
    }

    if critical > 0 {
        lines.push(String::new());
    }

    lines.push(format!("Successful: {}", successful));
    lines.push(format!("Tolerable:  {}", tolerable));
    lines.push(format!("Critical:   {}", critical));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// JUnit 4 report: a suite per test class, a case per test method
pub fn format_junit4(name: &str, results: &RunResults) -> String {
    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8" ?>"#.to_string(),
        format!(r#"<testsuites name="{}">"#, escape(name)),
    ];

    for program in &results.programs {
        for class in &program.test_classes {
            let open = format!(
                r#"  <testsuite name="{}" package="{}" tests="{}""#,
                escape(class.name.as_str()),
                escape(program.name.as_str()),
                class.test_methods.len()
            );

            if class.test_methods.is_empty() {
                lines.push(format!("{}/>", open));
                continue;
            }

            lines.push(format!("{}>", open));

            for method in &class.test_methods {
                let open = format!(
                    r#"    <testcase name="{}" classname="{}" status="{}""#,
                    escape(method.name.as_str()),
                    escape(class.name.as_str()),
                    method.status()
                );

                if method.alerts.is_empty() {
                    lines.push(format!("{}/>", open));
                    continue;
                }

                lines.push(format!("{}>", open));
                for alert in &method.alerts {
                    junit4_error(alert, &mut lines);
                }
                lines.push("    </testcase>".to_string());
            }

            lines.push("  </testsuite>".to_string());
        }
    }

    lines.push("</testsuites>".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn junit4_error(alert: &Alert, lines: &mut Vec<String>) {
    let open = format!(
        r#"      <error type="{}" message="{}""#,
        escape(alert.kind.as_str()),
        escape(alert.title.as_str())
    );

    if alert.details.is_empty() && alert.stack.is_empty() {
        lines.push(format!("{}/>", open));
        return;
    }

    lines.push(format!("{}>", open));
    for detail in &alert.details {
        lines.push(format!(
            "        <system-out>{}</system-out>",
            partial_escape(detail.as_str())
        ));
    }
    for frame in &alert.stack {
        lines.push(format!(
            "        <system-err>{}</system-err>",
            partial_escape(frame.as_str())
        ));
    }
    lines.push("      </error>".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingConnection;
    use clap::Parser;
    use sapcli_core::Response;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: AUnitCommand,
    }

    fn parse(argv: &[&str]) -> AUnitCommand {
        TestCli::parse_from(std::iter::once("aunit").chain(argv.iter().copied())).command
    }

    const RESULTS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<aunit:runResult xmlns:aunit="http://www.sap.com/adt/aunit" xmlns:adtcore="http://www.sap.com/adt/core">
  <alerts>
    <alert kind="noTestClasses" severity="tolerable"><title>The task definition does not refer to any test</title></alert>
  </alerts>
  <program adtcore:name="ZCL_THEKING_MANUAL_HARDCORE">
    <testClasses>
      <testClass adtcore:name="LTCL_TEST">
        <testMethods>
          <testMethod adtcore:name="DO_THE_FAIL">
            <alerts>
              <alert kind="failedAssertion" severity="critical">
                <title>Critical Assertion Error: &apos;I am supposed to fail&apos;</title>
                <details>
                  <detail text="Expected [1] but was [2]"/>
                </details>
                <stack>
                  <stackEntry description="Include: &lt;ZCL_THEKING_MANUAL_HARDCORE===CCAU&gt; Line: &lt;19&gt;"/>
                </stack>
              </alert>
            </alerts>
          </testMethod>
          <testMethod adtcore:name="DO_THE_WARN">
            <alerts>
              <alert kind="warning" severity="tolerable"><title>Warning: stay calm</title></alert>
            </alerts>
          </testMethod>
          <testMethod adtcore:name="DO_THE_TEST"/>
        </testMethods>
      </testClass>
      <testClass adtcore:name="LTCL_EMPTY">
        <testMethods/>
      </testClass>
    </testClasses>
  </program>
</aunit:runResult>"#;

    const PASSING_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<aunit:runResult xmlns:aunit="http://www.sap.com/adt/aunit" xmlns:adtcore="http://www.sap.com/adt/core">
  <program adtcore:name="ZREPORT">
    <testClasses>
      <testClass adtcore:name="LTCL_TEST">
        <testMethods>
          <testMethod adtcore:name="DO_THE_TEST"/>
        </testMethods>
      </testClass>
    </testClasses>
  </program>
</aunit:runResult>"#;

    fn results() -> RunResults {
        aunit::parse_run_results(RESULTS_XML).unwrap()
    }

    #[test]
    fn test_parse_run() {
        match parse(&["run", "class", "zcl_theking_manual_hardcore", "--output", "junit4"]) {
            AUnitCommand::Run {
                object_type,
                name,
                output,
            } => {
                assert_eq!(object_type, TestedType::Class);
                assert_eq!(name, "zcl_theking_manual_hardcore");
                assert_eq!(output, OutputFormat::Junit4);
            }
        }

        let AUnitCommand::Run { output, .. } = parse(&["run", "package", "$theking"]);
        assert_eq!(output, OutputFormat::Human);
    }

    #[test]
    fn test_reject_unknown_object_type() {
        let result = TestCli::try_parse_from(["aunit", "run", "interface", "zif_any"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_counts_critical_methods() {
        let connection = RecordingConnection::with_responses(vec![Response::new(200, RESULTS_XML)]);

        let critical = handle_command(parse(&["run", "class", "zcl_theking_manual_hardcore"]), &connection)
            .await
            .unwrap();

        assert_eq!(critical, 1);
        assert_eq!(connection.calls(), vec!["POST /sap/bc/adt/abapunit/testruns"]);

        let body = connection.requests()[0].body.clone().unwrap();
        assert!(body.contains(
            r#"adtcore:uri="/sap/bc/adt/oo/classes/zcl_theking_manual_hardcore""#
        ));
    }

    #[tokio::test]
    async fn test_run_passing_program() {
        let connection = RecordingConnection::with_responses(vec![Response::new(200, PASSING_XML)]);

        let critical = handle_command(
            parse(&["run", "program", "zreport", "--output", "raw"]),
            &connection,
        )
        .await
        .unwrap();

        assert_eq!(critical, 0);
        let body = connection.requests()[0].body.clone().unwrap();
        assert!(body.contains(r#"adtcore:uri="/sap/bc/adt/programs/programs/zreport""#));
    }

    #[test]
    fn test_format_human() {
        assert_eq!(
            format_human(&results()),
            "* [tolerable] [noTestClasses] - The task definition does not refer to any test
ZCL_THEKING_MANUAL_HARDCORE
  LTCL_TEST
    DO_THE_FAIL [ERR]
    DO_THE_WARN [SKIP]
    DO_THE_TEST [OK]
  LTCL_EMPTY

ZCL_THEKING_MANUAL_HARDCORE=>LTCL_TEST=>DO_THE_FAIL
*  [critical] [failedAssertion] - Critical Assertion Error: 'I am supposed to fail'

Successful: 1
Tolerable:  1
Critical:   1
"
        );
    }

    #[test]
    fn test_format_human_empty_run() {
        assert_eq!(
            format_human(&RunResults::default()),
            "Successful: 0\nTolerable:  0\nCritical:   0\n"
        );
    }

    #[test]
    fn test_format_junit4() {
        assert_eq!(
            format_junit4("ZCL_THEKING_MANUAL_HARDCORE", &results()),
            r#"<?xml version="1.0" encoding="UTF-8" ?>
<testsuites name="ZCL_THEKING_MANUAL_HARDCORE">
  <testsuite name="LTCL_TEST" package="ZCL_THEKING_MANUAL_HARDCORE" tests="3">
    <testcase name="DO_THE_FAIL" classname="LTCL_TEST" status="ERR">
      <error type="failedAssertion" message="Critical Assertion Error: &apos;I am supposed to fail&apos;">
        <system-out>Expected [1] but was [2]</system-out>
        <system-err>Include: &lt;ZCL_THEKING_MANUAL_HARDCORE===CCAU&gt; Line: &lt;19&gt;</system-err>
      </error>
    </testcase>
    <testcase name="DO_THE_WARN" classname="LTCL_TEST" status="SKIP">
      <error type="warning" message="Warning: stay calm"/>
    </testcase>
    <testcase name="DO_THE_TEST" classname="LTCL_TEST" status="OK"/>
  </testsuite>
  <testsuite name="LTCL_EMPTY" package="ZCL_THEKING_MANUAL_HARDCORE" tests="0"/>
</testsuites>
"#
        );
    }
}
