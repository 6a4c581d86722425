mod common;
use basic::lang::ErrorCode;
use basic::mach::read_blobs;
use common::*;
use indoc::indoc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn u32_at(region: &[u8], pos: usize) -> u32 {
    let mut b = [0; 4];
    b.copy_from_slice(&region[pos..pos + 4]);
    u32::from_le_bytes(b)
}

#[test]
fn test_header_length_matches_payload() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let mut source = String::from("print \"start\"\n");
        let mut expected = vec![];
        for n in 0..rng.gen_range(1..4) {
            let entry = rng.gen_range(0..64) * 4;
            source.push_str(&format!("CSub R{} integer, float {:08X}\n", n, entry));
            let mut words = vec![entry];
            for _ in 0..rng.gen_range(0..4) {
                let line: Vec<u32> = (0..rng.gen_range(1..5)).map(|_| rng.gen()).collect();
                let text: Vec<String> = line.iter().map(|w| format!("{:08x}", w)).collect();
                source.push_str(&text.join(" "));
                source.push('\n');
                words.extend(line);
            }
            source.push_str("End CSub\n");
            expected.push(words);
        }
        let dir = tree(&[("main.bas", source.as_str())]);
        let loader = load(&dir, "main.bas");
        let region = loader.program().blob_region();
        assert_eq!(region.len() % 8, 0);
        let mut pos = 0;
        for words in &expected {
            let len = u32_at(region, pos + 8) as usize;
            assert_eq!(len, words.len() * 4);
            pos = (pos + 12 + len + 7) & !7;
        }
        assert_eq!(&region[pos..], &[0xFF; 8][..]);
        let blobs = read_blobs(region).unwrap();
        let decoded: Vec<Vec<u32>> = blobs.into_iter().map(|b| b.words).collect();
        assert_eq!(decoded, expected);
    }
}

#[test]
fn test_csub_owner_is_its_declaration() {
    let dir = tree(&[(
        "main.bas",
        indoc! {"
            Font: DefineFont #9
            00000000 FFFFFFFF
            End DefineFont
            CSub flash
            E12FFF1E
            End CSub
        "},
    )]);
    let loader = load(&dir, "main.bas");
    let blobs = read_blobs(loader.program().blob_region()).unwrap();
    assert_eq!(blobs[0].owner, 8);
    assert_eq!(blobs[0].words, [0, 0xFFFF_FFFF]);
    let owner = blobs[1].owner as usize;
    assert_eq!(loader.program().bytes()[owner], basic::lang::token::Command::Csub.byte());
    assert_eq!(loader.locate(owner).map(|(_, line)| line), Some(4));
}

#[test]
fn test_packing_errors_are_located() {
    let cases = [
        ("CSub 9lives\nEnd CSub\n", ErrorCode::InvalidFunctionName, 1),
        ("CSub ok\n0000000G\nEnd CSub\n", ErrorCode::InvalidHexWord, 2),
        ("CSub ok\n1234567\nEnd CSub\n", ErrorCode::InvalidHexWord, 2),
        ("print 1\nCSub ok\n00000000\n", ErrorCode::MissingEndCommand, 2),
        ("DefineFont #1\n00000000\n", ErrorCode::MissingEndCommand, 1),
        ("DefineFont #17\nEnd DefineFont\n", ErrorCode::SyntaxError, 1),
    ];
    for (source, code, line) in cases.iter() {
        let dir = tree(&[("main.bas", *source)]);
        let (loader, result) = try_load(&dir, "main.bas");
        let e = result.unwrap_err();
        assert_eq!(e.code(), *code, "{}", source);
        assert_eq!(e.location().map(|(_, l)| l), Some(*line), "{}", source);
        assert!(loader.program().is_empty());
    }
}
