#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $file() {
            use nebula_lang::Nebula;

            let mut expected = vec![$($expected),*];

            // if exists, concat expected lines with new lines
            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    // add empty string to end to add new line to end of output
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let mut nebula = Nebula::new(&mut output);

            nebula
                .run_file(&format!(
                    "tests/target/{}/{}.neb",
                    stringify!($scope),
                    stringify!($file)
                ))
                .expect("program should run");

            // drop nebula here to release the borrow on output before reading it
            drop(nebula);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR $($expected:expr)+) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;

            let output = vec![$($expected),+].join("\n");
            let file = format!(
                "tests/target/{}/{}.neb",
                stringify!($scope),
                stringify!($file)
            );

            Command::cargo_bin("nebula").unwrap()
                .arg(file)
                .assert()
                .stderr(format!("nebula error: {output}\n"))
                .failure();
        }
    };
}
