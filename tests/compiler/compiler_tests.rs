use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::json;
use templar::compiler::INLINE_IDENTIFIER;
use templar::{
    create_default_registry, ArtifactCache, DataContext, Templar, TemplarConfig, TemplateCompiler,
    TemplateError, TemplateSource,
};

fn write_view(config: &TemplarConfig, name: &str, text: &str) -> std::path::PathBuf {
    std::fs::create_dir_all(&config.view_path).unwrap();
    let path = config.view_path.join(format!("{}.{}", name, config.extension));
    std::fs::write(&path, text).unwrap();
    path
}

fn touch_future(path: &std::path::Path) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
}

mod transform_tests {
    use super::*;

    #[test]
    fn test_same_source_yields_identical_artifacts() {
        let registry = create_default_registry().unwrap();
        let compiler = TemplateCompiler::new(&registry);
        let text = "@foreach($items as $item)<li>%item.name%</li>@endforeach %!debug!%";
        let a = compiler.transform(text);
        let b = compiler.transform(text);
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "<?tpl foreach $items as $item ?><li><?tpl print $item.name ?></li><?tpl endforeach ?> <?tpl dump $debug ?>"
        );
    }

    #[test]
    fn test_every_builtin_directive_expands() {
        let registry = create_default_registry().unwrap();
        let compiler = TemplateCompiler::new(&registry);
        let cases = [
            ("@php($a = 1)", "<?tpl exec $a = 1 ?>"),
            ("@if($a)", "<?tpl if $a ?>"),
            ("@elseif($b)", "<?tpl elseif $b ?>"),
            ("@else", "<?tpl else ?>"),
            ("@endif", "<?tpl endif ?>"),
            ("@foreach($xs as $x)", "<?tpl foreach $xs as $x ?>"),
            ("@endforeach", "<?tpl endforeach ?>"),
            ("@for($i = 0; $i < 3; $i++)", "<?tpl for $i = 0; $i < 3; $i++ ?>"),
            ("@endfor", "<?tpl endfor ?>"),
            ("@while($go)", "<?tpl while $go ?>"),
            ("@endwhile", "<?tpl endwhile ?>"),
            ("@do", "<?tpl do ?>"),
            ("@dowhile($go)", "<?tpl dowhile $go ?>"),
            ("@uppercase($s)", "<?tpl echo upper($s) ?>"),
            ("@lowercase($s)", "<?tpl echo lower($s) ?>"),
            ("@json($v)", "<?tpl echo json($v) ?>"),
            ("@date($t)", "<?tpl echo date($t) ?>"),
            ("@dateformat($t, 'Y')", "<?tpl echo date($t, 'Y') ?>"),
            ("@dump($v)", "<?tpl dump $v ?>"),
        ];
        for (source, expected) in cases {
            assert_eq!(compiler.transform(source).as_str(), expected, "{}", source);
        }
    }

    #[test]
    fn test_later_directive_sees_earlier_expansion() {
        let mut registry = create_default_registry().unwrap();
        registry
            .register("greet", true, |arg| {
                templar::CodeFragment::text(format!("@uppercase({})", arg))
            })
            .unwrap();
        let compiler = TemplateCompiler::new(&registry);
        // greet runs after uppercase, so its output stays literal
        assert_eq!(compiler.transform("@greet($n)").as_str(), "@uppercase($n)");

        let mut registry = templar::DirectiveRegistry::new();
        registry
            .register("greet", true, |arg| {
                templar::CodeFragment::text(format!("@shout({})", arg))
            })
            .unwrap();
        registry
            .register("shout", true, |arg| templar::CodeFragment::echo(&format!("upper({})", arg)))
            .unwrap();
        let compiler = TemplateCompiler::new(&registry);
        assert_eq!(compiler.transform("@greet($n)").as_str(), "<?tpl echo upper($n) ?>");
    }
}

mod cache_tests {
    use super::*;

    #[test]
    fn test_stale_artifact_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let config = TemplarConfig::rooted_at(dir.path());
        let path = write_view(&config, "page", "v1 %name%");
        let templar = Templar::new(config).unwrap();
        let ctx = DataContext::new().with("name", "Ann");

        assert_eq!(templar.render("page", &ctx).unwrap(), "v1 Ann");
        assert_eq!(templar.render("page", &ctx).unwrap(), "v1 Ann");
        assert_eq!(templar.cache().stats().misses, 1);

        std::fs::write(&path, "v2 %name%").unwrap();
        touch_future(&path);
        let source = TemplateSource::from_file(&path).unwrap();
        assert!(!templar.cache().is_fresh(&source));

        assert_eq!(templar.render("page", &ctx).unwrap(), "v2 Ann");
        let stats = templar.cache().stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.stores, 2);
    }

    #[test]
    fn test_artifact_file_named_by_identifier_hash() {
        let dir = tempfile::tempdir().unwrap();
        let config = TemplarConfig::rooted_at(dir.path());
        let path = write_view(&config, "page", "@if($a)yes@endif");
        let cache_dir = config.cache_path.clone();
        let templar = Templar::new(config).unwrap();
        templar.render("page", &DataContext::new()).unwrap();

        let source = TemplateSource::from_file(&path).unwrap();
        let entry = templar.cache().entry(&source).unwrap();
        assert_eq!(entry.source_identifier, path.to_string_lossy());
        assert!(entry.artifact_path.starts_with(&cache_dir));
        let file_name = entry.artifact_path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(file_name.len(), 32 + ".tplc".len());
        assert!(file_name.ends_with(".tplc"));
        assert_eq!(
            std::fs::read_to_string(&entry.artifact_path).unwrap(),
            "<?tpl if $a ?>yes<?tpl endif ?>"
        );
    }

    #[test]
    fn test_store_overwrites_and_load_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());
        let registry = create_default_registry().unwrap();
        let compiler = TemplateCompiler::new(&registry);
        let source = TemplateSource::inline("first");

        cache.store(&source, &compiler.transform("first")).unwrap();
        cache.store(&source, &compiler.transform("second")).unwrap();
        assert_eq!(
            cache.load(INLINE_IDENTIFIER).unwrap().unwrap().as_str(),
            "second"
        );
        // inline sources have no mtime and are never fresh
        assert!(!cache.is_fresh(&source));
        assert_eq!(cache.stats().stores, 2);
    }

    #[test]
    fn test_concurrent_renders_share_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = TemplarConfig::rooted_at(dir.path());
        write_view(&config, "list", "@foreach($xs as $x)%x%,@endforeach");
        let templar = Arc::new(Templar::new(config).unwrap());
        let ctx = Arc::new(DataContext::from_json(json!({"xs": [1, 2, 3]})).unwrap());

        // warm once so every thread sees a fresh artifact
        templar.render("list", &ctx).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let templar = templar.clone();
                let ctx = ctx.clone();
                std::thread::spawn(move || templar.render("list", &ctx).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "1,2,3,");
        }
        let stats = templar.cache().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 4);
    }

    #[test]
    fn test_missing_view() {
        let dir = tempfile::tempdir().unwrap();
        let templar = Templar::new(TemplarConfig::rooted_at(dir.path())).unwrap();
        let err = templar.render("absent", &DataContext::new()).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateNotFound(ref p) if p.ends_with("absent.tpl")));
    }

    #[test]
    fn test_clear_forces_recompile() {
        let dir = tempfile::tempdir().unwrap();
        let config = TemplarConfig::rooted_at(dir.path());
        write_view(&config, "page", "x");
        let templar = Templar::new(config).unwrap();
        let ctx = DataContext::new();
        templar.render("page", &ctx).unwrap();
        templar.cache().clear().unwrap();
        templar.render("page", &ctx).unwrap();
        assert_eq!(templar.cache().stats().misses, 2);
    }
}
