//! On-disk study fixture shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const OUTPUT_DIR: &str = "20201014-1422eco-hello";

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, content).expect("write fixture file");
}

/// One area (`fr`), no links or clusters, one economy output with a
/// single Monte-Carlo year.
pub fn mini_study(root: &Path) {
    write(root, "Desktop.ini", "[.shellclassinfo]\niconfile = settings/resources/study.ico\niconindex = 0\ninfotip = Antares Study8.0: mini\n");
    write(
        root,
        "study.antares",
        "[antares]\nversion = 800\ncaption = mini\ncreated = 1602678639\nlastsave = 1602678639\nauthor = Unknown\n",
    );

    write(
        root,
        "settings/generaldata.ini",
        "[general]\nmode = Economy\nhorizon = 2030\nnbyears = 1\nyear-by-year = False\n\n[output]\nsynthesis = True\nstorenewset = False\n",
    );
    write(root, "settings/comments.txt", "first study\n");
    write(root, "settings/resources/study.ico", "ICO");
    fs::create_dir_all(root.join("settings/simulations")).expect("create dirs");
    write(root, "layers/layers.ini", "[layers]\n0 = All\n");
    write(root, "logs/solver.log", "done\n");

    write(root, "input/areas/list.txt", "FR\n");
    write(root, "input/areas/sets.ini", "");
    write(
        root,
        "input/areas/fr/optimization.ini",
        "[nodal optimization]\nnon-dispatchable-power = True\nspread-unsupplied-energy-cost = 0.5\n\n[filtering]\nfilter-synthesis = annual\nfilter-year-by-year = annual\n",
    );
    write(root, "input/areas/fr/ui.ini", "[ui]\nx = 0\ny = 1\ncolor_r = 230\ncolor_g = 108\ncolor_b = 44\nlayers = 0\n");

    write(root, "input/bindingconstraints/bindingconstraints.ini", "");

    write(root, "input/hydro/allocation/fr.ini", "[[allocation]]\nfr = 1\n");
    for matrix in ["creditmodulations", "inflowPattern", "maxpower", "reservoir", "waterValues"] {
        write(root, &format!("input/hydro/common/capacity/{matrix}_fr.txt"), "1\t2\n3\t4\n");
    }
    write(root, "input/hydro/prepro/fr/energy.txt", "");
    write(root, "input/hydro/prepro/fr/prepro.ini", "[prepro]\nintermonthly-correlation = 0.5\n");
    write(root, "input/hydro/prepro/correlation.ini", "[general]\nmode = annual\n");
    write(root, "input/hydro/series/fr/mod.txt", "");
    write(root, "input/hydro/series/fr/ror.txt", "");
    write(root, "input/hydro/hydro.ini", "[reservoir]\nfr = False\n");

    write(root, "input/links/fr/properties.ini", "");

    for series in ["load", "solar", "wind"] {
        for matrix in ["conversion", "data", "k", "translation"] {
            write(root, &format!("input/{series}/prepro/fr/{matrix}.txt"), "");
        }
        write(root, &format!("input/{series}/prepro/fr/settings.ini"), "");
        write(root, &format!("input/{series}/prepro/correlation.ini"), "");
        write(root, &format!("input/{series}/series/{series}_fr.txt"), "10\n20\n");
    }
    write(root, "input/misc-gen/miscgen-fr.txt", "");
    write(root, "input/reserves/fr.txt", "");

    write(root, "input/thermal/clusters/fr/list.ini", "");
    write(root, "input/thermal/areas.ini", "[unserverdenergycost]\nfr = 1000.0\n\n[spilledenergycost]\nfr = 0.0\n");

    let output = format!("output/{OUTPUT_DIR}");
    for file in ["areas.txt", "comments.txt", "links.txt", "map"] {
        write(root, &format!("{output}/about-the-study/{file}"), "");
    }
    write(
        root,
        &format!("{output}/about-the-study/parameters.ini"),
        "[general]\nmode = Economy\nnbyears = 1\nyear-by-year = True\n\n[output]\nsynthesis = True\n",
    );
    write(root, &format!("{output}/about-the-study/study.ini"), "[antares]\nversion = 800\n");
    for series in ["hydro", "load", "solar", "wind"] {
        write(root, &format!("{output}/ts-numbers/{series}/fr.txt"), "size:1x1\n1\n");
    }
    for file in ["annualSystemCost.txt", "checkIntegrity.txt", "simulation-comments.txt", "simulation.log"] {
        write(root, &format!("{output}/{file}"), "");
    }
    write(
        root,
        &format!("{output}/info.antares-output"),
        "[general]\nversion = 800\nname = hello\nmode = Economy\ndate = 2020.10.14 - 14:22\ntimestamp = 1602678639\n",
    );
    for kind in ["details", "id", "values"] {
        write(root, &format!("{output}/economy/mc-all/areas/fr/{kind}-annual.txt"), "");
    }
    for file in ["areas", "digest", "links", "thermals"] {
        write(root, &format!("{output}/economy/mc-all/grid/{file}.txt"), "");
    }
    for kind in ["details", "values"] {
        write(root, &format!("{output}/economy/mc-ind/00001/areas/fr/{kind}-annual.txt"), "");
    }
}
